//! Host function registration via Wasmtime linker.
//!
//! Each resolved import is registered under its `namespace::symbol` as a
//! `() -> i32` function. The registered closure:
//! 1. Looks up the resolved callable in `HostState` by import index
//! 2. Calls it and counts the call
//! 3. Returns the value to the guest, or fails the call with a
//!    `HostCallFailure` carrying the host's error
//!
//! The failure travels back through Wasmtime as an `anyhow::Error` and is
//! recovered by downcasting in the runtime.

use tracing::trace;
use wasmtime::{Caller, Linker};

use hostlink_hostapi::ImportName;

use crate::error::SandboxError;
use crate::host_impl::{HostState, ResolvedImport};

/// Register every resolved import with the linker, in import index order.
pub fn register_host_functions(
    linker: &mut Linker<HostState>,
    imports: &[ResolvedImport],
) -> Result<(), SandboxError> {
    for (index, import) in imports.iter().enumerate() {
        register_import(linker, index, &import.name)?;
    }
    Ok(())
}

fn register_import(
    linker: &mut Linker<HostState>,
    index: usize,
    name: &ImportName,
) -> Result<(), SandboxError> {
    linker.func_wrap(
        &name.namespace,
        &name.symbol,
        move |mut caller: Caller<'_, HostState>| -> anyhow::Result<i32> {
            let value = caller.data_mut().call_import(index)?;
            trace!(import = index, value, "host call returned");
            Ok(value)
        },
    )?;
    Ok(())
}
