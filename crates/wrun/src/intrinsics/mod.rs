//! Host functions offered to every module before any other resolver runs.
//!
//! The registry is built once and is read-only afterwards. Each entry holds
//! a constructor rather than a function object because wasmtime functions
//! belong to a store, and the runner creates a fresh store per run.

use std::collections::HashMap;
use std::io::Write;

use wasmtime::{Caller, Func};

use crate::store::{HostState, Store};
use crate::value::{FuncSig, ObjectType, ValKind};

type MakeFunc = fn(&mut Store) -> Func;

/// A host function registered under a (module, name) pair.
pub struct Intrinsic {
    signature: FuncSig,
    make: MakeFunc,
}

impl Intrinsic {
    pub fn signature(&self) -> &FuncSig {
        &self.signature
    }

    /// Create the function in `store`.
    pub fn instantiate(&self, store: &mut Store) -> Func {
        store.data_mut().track_object();
        (self.make)(store)
    }
}

/// Immutable registry of intrinsics keyed by (module name, export name).
#[derive(Default)]
pub struct IntrinsicRegistry {
    entries: HashMap<(String, String), Intrinsic>,
}

impl IntrinsicRegistry {
    /// A registry with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> IntrinsicRegistryBuilder {
        IntrinsicRegistryBuilder {
            registry: Self::default(),
        }
    }

    /// The intrinsics the `wrun` binary provides: the `spectest` printing
    /// functions and a small `env` set for C toolchains.
    pub fn standard() -> Self {
        use ValKind::*;
        Self::builder()
            .func("spectest", "print", FuncSig::new([], None), |store| {
                Func::wrap(store, || println!())
            })
            .func("spectest", "print_i32", FuncSig::new([I32], None), |store| {
                Func::wrap(store, |v: i32| println!("{v} : i32"))
            })
            .func("spectest", "print_i64", FuncSig::new([I64], None), |store| {
                Func::wrap(store, |v: i64| println!("{v} : i64"))
            })
            .func("spectest", "print_f32", FuncSig::new([F32], None), |store| {
                Func::wrap(store, |v: f32| println!("{v} : f32"))
            })
            .func("spectest", "print_f64", FuncSig::new([F64], None), |store| {
                Func::wrap(store, |v: f64| println!("{v} : f64"))
            })
            .func(
                "spectest",
                "print_i32_f32",
                FuncSig::new([I32, F32], None),
                |store| Func::wrap(store, |a: i32, b: f32| println!("{a} : i32\n{b} : f32")),
            )
            .func(
                "spectest",
                "print_f64_f64",
                FuncSig::new([F64, F64], None),
                |store| Func::wrap(store, |a: f64, b: f64| println!("{a} : f64\n{b} : f64")),
            )
            .func("env", "abort", FuncSig::new([], None), |store| {
                Func::wrap(store, || -> anyhow::Result<()> { anyhow::bail!("abort() called") })
            })
            .func("env", "putchar", FuncSig::new([I32], Some(I32)), |store| {
                Func::wrap(store, |c: i32| {
                    let mut stdout = std::io::stdout();
                    match stdout.write_all(&[c as u8]) {
                        Ok(()) => c,
                        Err(_) => -1,
                    }
                })
            })
            .func(
                "env",
                "emscripten_get_now",
                FuncSig::new([], Some(F64)),
                |store| {
                    Func::wrap(store, |caller: Caller<'_, HostState>| {
                        caller.data().started().elapsed().as_secs_f64() * 1000.0
                    })
                },
            )
            .build()
    }

    /// Find an intrinsic matching the request. Only function requests whose
    /// signature equals the registered one match.
    pub fn lookup(&self, module: &str, name: &str, ty: &ObjectType) -> Option<&Intrinsic> {
        let ObjectType::Function(signature) = ty else {
            return None;
        };
        self.entries
            .get(&(module.to_string(), name.to_string()))
            .filter(|intrinsic| intrinsic.signature == *signature)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct IntrinsicRegistryBuilder {
    registry: IntrinsicRegistry,
}

impl IntrinsicRegistryBuilder {
    /// Register a host function. A later registration under the same name
    /// replaces an earlier one.
    pub fn func(mut self, module: &str, name: &str, signature: FuncSig, make: MakeFunc) -> Self {
        self.registry.entries.insert(
            (module.to_string(), name.to_string()),
            Intrinsic { signature, make },
        );
        self
    }

    pub fn build(self) -> IntrinsicRegistry {
        self.registry
    }
}
