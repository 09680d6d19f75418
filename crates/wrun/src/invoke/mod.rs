use std::fmt;
use std::time::Instant;

use wasmtime::Trap;

use crate::entry::EntryPoint;
use crate::marshal::{CallingConvention, Invocation};
use crate::store::Store;
use crate::value::Val;

/// Process status reported for a trapped call.
pub const TRAP_EXIT_CODE: i32 = 1;

/// How a call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExitOutcome {
    Returned { result: Option<Val>, status: i32 },
    Trapped(TrapReport),
}

impl ExitOutcome {
    /// A successful outcome that did not call anything, e.g. `--check`.
    pub fn success() -> Self {
        ExitOutcome::Returned {
            result: None,
            status: 0,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ExitOutcome::Returned { status, .. } => *status,
            ExitOutcome::Trapped(_) => TRAP_EXIT_CODE,
        }
    }
}

/// Why a call stopped abruptly.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapReport {
    /// The trap code, when the runtime raised one. Host functions that fail
    /// (e.g. `env.abort`) have none.
    pub trap: Option<Trap>,
    pub message: String,
}

impl TrapReport {
    fn from_error(err: &anyhow::Error) -> Self {
        Self {
            trap: err.downcast_ref::<Trap>().copied(),
            message: format!("{err:#}"),
        }
    }
}

impl fmt::Display for TrapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Call the entry point once and interpret the result.
///
/// With the explicit convention the result is only logged and the status is
/// 0. With the default convention an `i32` result becomes the status.
pub fn invoke(store: &mut Store, entry: &EntryPoint, invocation: &Invocation) -> ExitOutcome {
    let params: Vec<wasmtime::Val> = invocation.args.iter().map(|v| (*v).into()).collect();
    let mut results = vec![wasmtime::Val::I32(0); usize::from(entry.signature.result.is_some())];

    let timer = Instant::now();
    let call = entry.func.call(&mut *store, &params, &mut results);
    tracing::debug!(
        entry = %entry.name,
        elapsed_ms = timer.elapsed().as_secs_f64() * 1000.0,
        "invoked function"
    );

    if let Err(err) = call {
        let report = TrapReport::from_error(&err);
        tracing::debug!(entry = %entry.name, trap = ?report.trap, "call trapped");
        return ExitOutcome::Trapped(report);
    }

    let result = results.first().and_then(Val::from_wasm);
    let status = match invocation.convention {
        CallingConvention::Explicit => {
            let shown = result.map_or("nothing".to_string(), |v| v.to_string());
            tracing::debug!("{} returned: {shown}", entry.name);
            0
        }
        CallingConvention::DefaultEntry => match result {
            Some(Val::I32(status)) => status,
            _ => 0,
        },
    };
    ExitOutcome::Returned { result, status }
}
