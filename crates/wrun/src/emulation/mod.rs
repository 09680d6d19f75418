//! Host environment emulation for C-style entry points.

use wasmtime::Memory;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::value::Val;

const PAGE_SIZE: u64 = 65536;
const POINTER_SIZE: u64 = 4;

/// Write `args` into `memory` as a NUL-terminated `argv` array and return
/// the `(argc, argv)` pair to pass to `main`.
///
/// The strings go into freshly grown pages so nothing the module placed in
/// memory is overwritten. Layout from the first new page: the pointer array
/// (`argc` entries plus a null terminator), then the string bytes.
pub fn prepare_argv(store: &mut Store, memory: Memory, args: &[String]) -> Result<[Val; 2]> {
    if memory.ty(&*store).is_64() {
        return Err(Error::ArgumentInjection(
            "64-bit memories are not supported".into(),
        ));
    }

    let table_size = (args.len() as u64 + 1) * POINTER_SIZE;
    let strings_size: u64 = args.iter().map(|a| a.len() as u64 + 1).sum();
    let needed = table_size + strings_size;
    let pages = needed.div_ceil(PAGE_SIZE);

    let previous_pages = memory
        .grow(&mut *store, pages)
        .map_err(|e| Error::ArgumentInjection(format!("{e:#}")))?;
    let base = previous_pages * PAGE_SIZE;
    if base + needed > u64::from(u32::MAX) + 1 {
        return Err(Error::ArgumentInjection(
            "arguments do not fit in 32-bit memory".into(),
        ));
    }

    let mut table = Vec::with_capacity(table_size as usize);
    let mut strings = Vec::with_capacity(strings_size as usize);
    let strings_base = base + table_size;
    for arg in args {
        let address = strings_base + strings.len() as u64;
        table.extend_from_slice(&(address as u32).to_le_bytes());
        strings.extend_from_slice(arg.as_bytes());
        strings.push(0);
    }
    table.extend_from_slice(&0u32.to_le_bytes());

    let write = |store: &mut Store, offset: u64, bytes: &[u8]| {
        memory
            .write(&mut *store, offset as usize, bytes)
            .map_err(|e| Error::ArgumentInjection(e.to_string()))
    };
    write(&mut *store, base, &table)?;
    write(&mut *store, strings_base, &strings)?;

    tracing::debug!(argc = args.len(), argv = base, "injected command arguments");
    Ok([Val::I32(args.len() as i32), Val::I32(base as u32 as i32)])
}
