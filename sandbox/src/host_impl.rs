//! Per-instance state held in the Wasmtime Store.
//!
//! `HostState` carries the host callables resolved during instantiation and
//! a count of how often the guest has called out through them. It lives in
//! `Store<HostState>` for as long as the owning instance.

use tracing::warn;

use hostlink_hostapi::{HostCallFailure, HostFunc, ImportName};

/// A declared import bound to the host callable that backs it.
#[derive(Debug, Clone)]
pub struct ResolvedImport {
    pub name: ImportName,
    pub func: HostFunc,
}

impl ResolvedImport {
    /// Call the host, tagging any failure with the import name.
    pub fn call(&self) -> Result<i32, HostCallFailure> {
        self.func
            .call()
            .map_err(|e| HostCallFailure::new(self.name.clone(), e))
    }
}

/// Per-instance mutable state held in the Wasmtime `Store`.
#[derive(Debug, Default)]
pub struct HostState {
    /// Resolved imports, in import index order.
    pub imports: Vec<ResolvedImport>,
    /// Number of host calls made through this instance.
    pub host_calls: u64,
}

impl HostState {
    pub fn new(imports: Vec<ResolvedImport>) -> Self {
        Self {
            imports,
            host_calls: 0,
        }
    }

    /// Invoke the import at `index`. Counts the attempt even if the host
    /// fails.
    ///
    /// A host failure comes back as an `anyhow::Error` wrapping
    /// [`HostCallFailure`]. An index with no resolved import is a plain
    /// error and is not counted.
    pub fn call_import(&mut self, index: usize) -> anyhow::Result<i32> {
        let import = self
            .imports
            .get(index)
            .ok_or_else(|| anyhow::anyhow!("no resolved import at index {}", index))?;
        self.host_calls += 1;
        import.call().map_err(|failure| {
            warn!(
                import = %failure.name(),
                error = %failure.host_error(),
                "host call failed"
            );
            anyhow::Error::new(failure)
        })
    }
}
