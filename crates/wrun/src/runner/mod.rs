//! The load → link → select → marshal → invoke pipeline, and the loop that
//! repeats it.

use std::path::PathBuf;
use std::str::FromStr;

use crate::entry::select_entry;
use crate::error::Result;
use crate::intrinsics::IntrinsicRegistry;
use crate::invoke::{ExitOutcome, TRAP_EXIT_CODE, invoke};
use crate::linker::{InstanceResolver, RootResolver, link_and_instantiate};
use crate::marshal::marshal;
use crate::store::Runtime;
use crate::{Engine, Module};

/// Iteration bound of the fuzzing loop.
pub const FUZZ_ITERATIONS: u32 = 2000;

/// Process status for any failure before the entry point runs.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// A dependency module instantiated before the main module and offered to
/// it under an import module name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preload {
    pub name: String,
    pub path: PathBuf,
}

impl FromStr for Preload {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok(Preload {
                name: name.to_string(),
                path: PathBuf::from(path),
            }),
            _ => Err(format!("expected NAME=PATH, got '{s}'")),
        }
    }
}

/// Everything one run needs to know.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub module: PathBuf,
    /// Call this export with parsed arguments instead of `main`.
    pub function: Option<String>,
    /// Stop after loading and validating.
    pub check_only: bool,
    pub preloads: Vec<Preload>,
    /// Arguments forwarded to the entry point.
    pub args: Vec<String>,
}

/// Runs modules against a fixed intrinsic registry.
pub struct Runner {
    engine: Engine,
    intrinsics: IntrinsicRegistry,
}

impl Runner {
    pub fn new(engine: Engine, intrinsics: IntrinsicRegistry) -> Self {
        Self { engine, intrinsics }
    }

    /// Run the whole pipeline once.
    ///
    /// Errors cover everything up to the call; what the call itself does,
    /// including trapping, is in the returned [`ExitOutcome`].
    pub fn run_once(&self, runtime: &mut Runtime, options: &RunOptions) -> Result<ExitOutcome> {
        let module = Module::load(&self.engine, &options.module)?;
        if options.check_only {
            return Ok(ExitOutcome::success());
        }

        let mut resolver = RootResolver::new(&self.engine, &self.intrinsics);
        for preload in &options.preloads {
            let dependency = Module::load(&self.engine, &preload.path)?;
            let linked = link_and_instantiate(runtime.store_mut(), &dependency, &mut resolver)?;
            tracing::debug!(name = %preload.name, path = %preload.path.display(), "preloaded module");
            resolver.register(&preload.name, InstanceResolver::new(linked.instance));
        }

        let store = runtime.store_mut();
        let linked = link_and_instantiate(store, &module, &mut resolver)?;
        let entry = select_entry(store, &linked.instance, options.function.as_deref())?;
        let program_path = options.module.display().to_string();
        let invocation = marshal(
            store,
            &linked,
            &entry,
            options.function.is_some(),
            &options.args,
            &program_path,
        )?;
        Ok(invoke(store, &entry, &invocation))
    }
}

/// Repeats runs, sweeping the runtime after each one.
#[derive(Debug, Clone, Copy)]
pub struct Harness {
    iterations: u32,
}

impl Default for Harness {
    fn default() -> Self {
        let iterations = if cfg!(feature = "fuzzing") {
            FUZZ_ITERATIONS
        } else {
            1
        };
        Self { iterations }
    }
}

impl Harness {
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Run `options` once per iteration and return the status of the last
    /// one. Neither errors nor traps stop the loop.
    pub fn run(&self, runner: &Runner, runtime: &mut Runtime, options: &RunOptions) -> i32 {
        let mut status = FAILURE_EXIT_CODE;
        for iteration in 0..self.iterations {
            status = match runner.run_once(runtime, options) {
                Ok(ExitOutcome::Trapped(report)) => {
                    tracing::error!(iteration, "runtime exception: {report}");
                    TRAP_EXIT_CODE
                }
                Ok(outcome) => outcome.exit_code(),
                Err(err) => {
                    tracing::error!(iteration, "{err}");
                    FAILURE_EXIT_CODE
                }
            };
            runtime.release_unreferenced();
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preload_parses_name_and_path() {
        assert_eq!(
            "libc=deps/libc.wasm".parse::<Preload>(),
            Ok(Preload {
                name: "libc".into(),
                path: PathBuf::from("deps/libc.wasm"),
            })
        );
        assert!("libc".parse::<Preload>().is_err());
        assert!("=x.wasm".parse::<Preload>().is_err());
    }

    #[test]
    fn harness_runs_at_least_once() {
        assert_eq!(Harness::with_iterations(0).iterations(), 1);
    }
}
