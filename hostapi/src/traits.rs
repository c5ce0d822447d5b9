//! Host binding trait: how a guest's declared imports find host callables.
//!
//! The sandbox calls [`HostBinding::resolve`] once per declared import while
//! instantiating a module. Whatever the host returns is linked into the
//! instance and invoked from the guest's call stack.

use std::fmt;
use std::sync::Arc;

use crate::error::ResolutionError;
use crate::types::{ImportName, Signature};

type Callable = dyn Fn() -> anyhow::Result<i32> + Send + Sync;

/// A resolved host callable together with the signature it was bound under.
///
/// Cloning is cheap: the callable is shared by reference. Hosts that need
/// mutable state use interior mutability (atomics, mutexes) inside the
/// closure.
#[derive(Clone)]
pub struct HostFunc {
    signature: Signature,
    callable: Arc<Callable>,
}

impl HostFunc {
    /// Wrap a `() -> i32` host callable.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<i32> + Send + Sync + 'static,
    {
        Self::with_signature(Signature::nullary_i32(), f)
    }

    /// Wrap a callable registered under an explicit signature.
    ///
    /// Only `() -> i32` bindings can be linked into a guest; other shapes
    /// are kept so that resolution can report a precise mismatch.
    pub fn with_signature<F>(signature: Signature, f: F) -> Self
    where
        F: Fn() -> anyhow::Result<i32> + Send + Sync + 'static,
    {
        Self {
            signature,
            callable: Arc::new(f),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Invoke the host callable.
    pub fn call(&self) -> anyhow::Result<i32> {
        (self.callable)()
    }
}

impl fmt::Debug for HostFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunc")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Supplies host callables for a guest module's imports.
///
/// Implementations own no guest state. A successful resolution must return
/// a callable whose signature equals `expected`.
pub trait HostBinding {
    /// Resolve `name` to a callable matching `expected`.
    ///
    /// Fails with [`ResolutionError::EmptyName`] for an empty namespace or
    /// symbol, [`ResolutionError::NotFound`] when nothing is bound under
    /// `name`, and [`ResolutionError::SignatureMismatch`] when the bound
    /// callable has a different signature.
    fn resolve(&self, name: &ImportName, expected: &Signature) -> Result<HostFunc, ResolutionError>;
}
