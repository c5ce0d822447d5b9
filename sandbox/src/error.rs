//! Sandbox error types.

use hostlink_hostapi::{HostCallFailure, ResolutionError};

use crate::runtime::InstanceState;

/// Errors from loading, validating and instantiating a guest module.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// Wasmtime engine, compilation, or linking error.
    #[error("wasmtime error: {0}")]
    Wasmtime(#[from] anyhow::Error),

    /// Module definition or compiled module violates the guest contract.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// WebAssembly binary could not be decoded.
    #[error("malformed module binary: {0}")]
    Malformed(#[from] wasmparser::BinaryReaderError),

    /// Persisted definition could not be parsed or serialized.
    #[error("definition error: {0}")]
    Definition(#[from] serde_json::Error),

    /// Definition file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A declared import could not be bound. Fatal to the instance.
    #[error("import resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    /// `instantiate` was called on an instance that already left `Unresolved`.
    #[error("instance already {0}; create a new instance to instantiate again")]
    AlreadyInstantiated(InstanceState),
}

/// Errors from invoking an export on an instance.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    /// The name does not match any export. The instance is unaffected.
    #[error("unknown export `{name}`")]
    UnknownExport { name: String },

    /// The instance is not `Instantiated`.
    #[error("instance is {state}, exports are not callable")]
    NotInstantiated { state: InstanceState },

    /// Wrong number of arguments for the export.
    #[error("export `{name}` takes {expected} arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// The host callable failed. Carries the host's error unchanged.
    #[error(transparent)]
    HostCall(#[from] HostCallFailure),

    /// Any other engine failure during the call.
    #[error("guest trapped: {0}")]
    Trapped(anyhow::Error),
}
