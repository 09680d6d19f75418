//! Errors reported while loading, linking and preparing a call.
//!
//! Traps are not errors: a call that traps produces
//! [`ExitOutcome::Trapped`](crate::ExitOutcome::Trapped).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::value::{FuncSig, ObjectType, ValKind};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    #[error("{}", UnresolvedList(.0))]
    Link(Vec<UnresolvedImport>),

    #[error("failed to instantiate module: {0}")]
    Instantiate(String),

    #[error("module does not export '{0}'")]
    ExportNotFound(String),

    #[error("module does not export a main function (tried {})", .0.join(", "))]
    NoEntryPoint(Vec<String>),

    #[error("'{name}' requires {expected} argument(s), but {got} were given")]
    ArgumentArity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("main function requires {got} argument(s): 0 or 2 expected, got {got}")]
    DefaultEntryArity { got: usize },

    #[error("main function with two parameters must take (i32, i32), found {0}")]
    DefaultEntrySignature(FuncSig),

    #[error("argument {position}: '{text}' is not a valid {kind}")]
    ArgumentParse {
        position: usize,
        kind: ValKind,
        text: String,
    },

    #[error("module has no memory for arguments")]
    NoMemoryForArguments,

    #[error("failed to write arguments into memory: {0}")]
    ArgumentInjection(String),

    #[error("unsupported signature: {0}")]
    UnsupportedSignature(String),
}

/// An import that no resolver tier could satisfy.
#[derive(Debug, Clone)]
pub struct UnresolvedImport {
    pub module: String,
    pub name: String,
    /// `None` when the import's type has no [`ObjectType`] form.
    pub ty: Option<ObjectType>,
}

impl fmt::Display for UnresolvedImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ty {
            Some(ty) => write!(f, "{}.{} : {ty}", self.module, self.name),
            None => write!(f, "{}.{} : <unsupported type>", self.module, self.name),
        }
    }
}

struct UnresolvedList<'a>(&'a [UnresolvedImport]);

impl fmt::Display for UnresolvedList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to link module, missing imports:")?;
        for import in self.0 {
            write!(f, "\n  {import}")?;
        }
        Ok(())
    }
}
