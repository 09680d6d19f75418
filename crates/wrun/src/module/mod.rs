use std::path::{Path, PathBuf};

use crate::Engine;
use crate::error::{Error, Result};

/// A validated and compiled WASM module (immutable).
#[derive(Clone)]
pub struct Module {
    pub(crate) compiled: wasmtime::Module,
    name: String,
}

impl Module {
    /// Parse a WAT string into a module.
    pub fn new(engine: &Engine, wat: &str) -> Result<Self> {
        let bytes = wat::parse_str(wat).map_err(|e| load_error("<inline>", e))?;
        Self::from_bytes(engine, "<inline>", &bytes)
    }

    /// Load a module from disk. Both the text and the binary format are
    /// accepted.
    pub fn load(engine: &Engine, path: &Path) -> Result<Self> {
        let contents = std::fs::read(path).map_err(|e| load_error(path, e))?;
        let bytes = wat::parse_bytes(&contents).map_err(|e| load_error(path, e))?;
        Self::from_bytes(engine, path, &bytes)
    }

    /// Create a module from raw WASM bytes.
    pub fn from_bytes(engine: &Engine, name: impl AsRef<Path>, bytes: &[u8]) -> Result<Self> {
        let name = name.as_ref();
        engine.validate(bytes).map_err(|e| load_error(name, e))?;
        let compiled = wasmtime::Module::new(engine.runtime(), bytes)
            .map_err(|e| load_error(name, format!("{e:#}")))?;
        tracing::debug!(module = %name.display(), bytes = bytes.len(), "loaded module");
        Ok(Module {
            compiled,
            name: name.display().to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Imports as (module, name, type), in declaration order.
    pub fn imports(&self) -> impl Iterator<Item = (&str, &str, wasmtime::ExternType)> + '_ {
        self.compiled
            .imports()
            .map(|import| (import.module(), import.name(), import.ty()))
    }
}

fn load_error(path: impl Into<PathBuf>, reason: impl ToString) -> Error {
    Error::Load {
        path: path.into(),
        reason: reason.to_string(),
    }
}
