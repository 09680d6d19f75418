use wasmtime::{Func, Instance};

use crate::error::{Error, Result};
use crate::store::Store;
use crate::value::FuncSig;

/// Export names tried, in order, when no function name is given. Some
/// toolchains prefix C symbols with an underscore.
pub const DEFAULT_ENTRY_NAMES: [&str; 2] = ["main", "_main"];

/// The function a run will call.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    pub name: String,
    pub func: Func,
    pub signature: FuncSig,
}

/// Locate the function to run.
///
/// With an explicit name only that export is considered. Otherwise the
/// [`DEFAULT_ENTRY_NAMES`] are tried in order.
pub fn select_entry(
    store: &mut Store,
    instance: &Instance,
    explicit_name: Option<&str>,
) -> Result<EntryPoint> {
    let (name, func) = match explicit_name {
        Some(name) => {
            let func = instance
                .get_func(&mut *store, name)
                .ok_or_else(|| Error::ExportNotFound(name.to_string()))?;
            (name, func)
        }
        None => DEFAULT_ENTRY_NAMES
            .iter()
            .find_map(|name| instance.get_func(&mut *store, name).map(|f| (*name, f)))
            .ok_or_else(|| {
                Error::NoEntryPoint(DEFAULT_ENTRY_NAMES.iter().map(|n| n.to_string()).collect())
            })?,
    };
    let signature = FuncSig::from_wasm(&func.ty(&*store))?;
    tracing::debug!(entry = name, %signature, "selected entry point");
    Ok(EntryPoint {
        name: name.to_string(),
        func,
        signature,
    })
}
