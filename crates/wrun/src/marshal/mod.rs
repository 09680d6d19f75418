//! Conversion of command-line arguments into call arguments.
//!
//! Which convention applies is decided by how the entry point was chosen:
//! a function named on the command line gets one parsed value per
//! parameter, the default entry point gets C-style `(argc, argv)`.

use crate::emulation::prepare_argv;
use crate::entry::EntryPoint;
use crate::error::{Error, Result};
use crate::linker::LinkedInstance;
use crate::store::Store;
use crate::value::{FuncSig, Val, ValKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
    /// A function named on the command line, called with parsed scalars.
    Explicit,
    /// `main`/`_main`, called with nothing or with `(argc, argv)`.
    DefaultEntry,
}

/// Arguments for one call of an entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub convention: CallingConvention,
    pub args: Vec<Val>,
}

/// What the default entry point expects to be called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultEntryShape {
    NoArgs,
    ArgcArgv,
}

impl DefaultEntryShape {
    pub fn of(signature: &FuncSig) -> Result<Self> {
        match signature.params.as_slice() {
            [] => Ok(DefaultEntryShape::NoArgs),
            [ValKind::I32, ValKind::I32] => Ok(DefaultEntryShape::ArgcArgv),
            [_, _] => Err(Error::DefaultEntrySignature(signature.clone())),
            params => Err(Error::DefaultEntryArity { got: params.len() }),
        }
    }
}

/// Parse one string per declared parameter.
pub fn parse_explicit_args(name: &str, signature: &FuncSig, args: &[String]) -> Result<Vec<Val>> {
    if args.len() != signature.params.len() {
        return Err(Error::ArgumentArity {
            name: name.to_string(),
            expected: signature.params.len(),
            got: args.len(),
        });
    }
    signature
        .params
        .iter()
        .zip(args)
        .enumerate()
        .map(|(position, (kind, text))| {
            kind.parse(text).ok_or_else(|| Error::ArgumentParse {
                position,
                kind: *kind,
                text: text.clone(),
            })
        })
        .collect()
}

/// Build the arguments for calling `entry`.
///
/// `explicit` selects the convention: it is true when the entry point was
/// named on the command line. `program_path` becomes `argv[0]` for a
/// two-parameter default entry point.
pub fn marshal(
    store: &mut Store,
    linked: &LinkedInstance,
    entry: &EntryPoint,
    explicit: bool,
    process_args: &[String],
    program_path: &str,
) -> Result<Invocation> {
    if explicit {
        let args = parse_explicit_args(&entry.name, &entry.signature, process_args)?;
        return Ok(Invocation {
            convention: CallingConvention::Explicit,
            args,
        });
    }

    let args = match DefaultEntryShape::of(&entry.signature)? {
        DefaultEntryShape::NoArgs => Vec::new(),
        DefaultEntryShape::ArgcArgv => {
            let memory = linked
                .default_memory(store)
                .ok_or(Error::NoMemoryForArguments)?;
            let argv: Vec<String> = std::iter::once(program_path.to_string())
                .chain(process_args.iter().cloned())
                .collect();
            prepare_argv(store, memory, &argv)?.to_vec()
        }
    };
    Ok(Invocation {
        convention: CallingConvention::DefaultEntry,
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn explicit_args_parse_by_kind() -> Result<()> {
        let sig = FuncSig::new([ValKind::I32, ValKind::F64], None);
        let vals = parse_explicit_args("f", &sig, &strings(&["42", "3.5"]))?;
        assert_eq!(vals, [Val::I32(42), Val::F64(3.5)]);
        Ok(())
    }

    #[test]
    fn unparsable_arg_names_its_position() {
        let sig = FuncSig::new([ValKind::I32, ValKind::F64], None);
        let err = parse_explicit_args("f", &sig, &strings(&["abc", "3.5"])).unwrap_err();
        assert!(matches!(
            err,
            Error::ArgumentParse {
                position: 0,
                kind: ValKind::I32,
                ..
            }
        ));
        assert_eq!(err.to_string(), "argument 0: 'abc' is not a valid i32");
    }

    #[test]
    fn explicit_arity_must_match() {
        let sig = FuncSig::new([ValKind::I64], None);
        let err = parse_explicit_args("f", &sig, &strings(&["1", "2"])).unwrap_err();
        assert!(matches!(
            err,
            Error::ArgumentArity {
                expected: 1,
                got: 2,
                ..
            }
        ));
    }

    #[test]
    fn default_entry_accepts_zero_or_two_params() {
        use ValKind::I32;
        assert_eq!(
            DefaultEntryShape::of(&FuncSig::new([], Some(I32))).unwrap(),
            DefaultEntryShape::NoArgs
        );
        assert_eq!(
            DefaultEntryShape::of(&FuncSig::new([I32, I32], Some(I32))).unwrap(),
            DefaultEntryShape::ArgcArgv
        );
        let err = DefaultEntryShape::of(&FuncSig::new([I32, I32, I32], None)).unwrap_err();
        assert!(matches!(err, Error::DefaultEntryArity { got: 3 }));
        assert!(err.to_string().contains("0 or 2 expected, got 3"));
    }

    #[test]
    fn two_param_default_entry_must_be_argc_argv() {
        use ValKind::{I32, I64};
        let err = DefaultEntryShape::of(&FuncSig::new([I64, I64], Some(I32))).unwrap_err();
        assert!(matches!(err, Error::DefaultEntrySignature(ref sig) if sig.params == [I64, I64]));
        assert_eq!(
            err.to_string(),
            "main function with two parameters must take (i32, i32), found (i64, i64) -> i32"
        );
        assert!(DefaultEntryShape::of(&FuncSig::new([I32, I64], None)).is_err());
    }
}
