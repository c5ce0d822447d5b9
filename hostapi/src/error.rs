//! Host-side error types.
//!
//! `ResolutionError` is returned by [`HostBinding::resolve`](crate::HostBinding::resolve)
//! when an import cannot be bound. `HostCallFailure` wraps whatever error a
//! host callable produced at call time, keeping the original error intact so
//! the caller of the export sees exactly what the host reported.

use crate::types::{ImportName, Signature};

/// Failure to bind a declared import to a host callable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// Namespace or symbol was empty.
    #[error("import name `{0}` has an empty namespace or symbol")]
    EmptyName(ImportName),

    /// No binding is registered under this name.
    #[error("no host binding for `{0}`")]
    NotFound(ImportName),

    /// A binding exists but its signature differs from the declared one.
    #[error("host binding `{name}` has signature {found}, module expects {expected}")]
    SignatureMismatch {
        name: ImportName,
        expected: Signature,
        found: Signature,
    },
}

impl ResolutionError {
    /// The import name the failure refers to.
    pub fn name(&self) -> &ImportName {
        match self {
            Self::EmptyName(name) | Self::NotFound(name) => name,
            Self::SignatureMismatch { name, .. } => name,
        }
    }
}

/// Opaque failure raised from inside a host callable.
///
/// The source error is carried unchanged; [`into_inner`](Self::into_inner)
/// hands it back to the host.
#[derive(Debug, thiserror::Error)]
#[error("host call `{name}` failed: {source}")]
pub struct HostCallFailure {
    name: ImportName,
    #[source]
    source: anyhow::Error,
}

impl HostCallFailure {
    pub fn new(name: ImportName, source: anyhow::Error) -> Self {
        Self { name, source }
    }

    /// The import whose host callable failed.
    pub fn name(&self) -> &ImportName {
        &self.name
    }

    /// Borrow the host's original error.
    pub fn host_error(&self) -> &anyhow::Error {
        &self.source
    }

    /// Take back the host's original error.
    pub fn into_inner(self) -> anyhow::Error {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValType;

    #[test]
    fn test_not_found_display() {
        let err = ResolutionError::NotFound(ImportName::new("env", "get_number"));
        assert_eq!(err.to_string(), "no host binding for `env::get_number`");
    }

    #[test]
    fn test_mismatch_display() {
        let err = ResolutionError::SignatureMismatch {
            name: ImportName::new("env", "get_number"),
            expected: Signature::nullary_i32(),
            found: Signature::new(vec![], vec![ValType::I64]),
        };
        let s = err.to_string();
        assert!(s.contains("env::get_number"));
        assert!(s.contains("() -> (i64)"));
        assert!(s.contains("() -> (i32)"));
    }

    #[test]
    fn test_name_accessor() {
        let name = ImportName::new("", "x");
        let err = ResolutionError::EmptyName(name.clone());
        assert_eq!(err.name(), &name);
    }

    #[test]
    fn test_host_call_failure_keeps_source() {
        let failure = HostCallFailure::new(
            ImportName::new("env", "get_number"),
            anyhow::anyhow!("sensor offline"),
        );
        assert!(failure.to_string().contains("sensor offline"));
        assert_eq!(failure.name().symbol, "get_number");
        assert_eq!(failure.host_error().to_string(), "sensor offline");
        assert_eq!(failure.into_inner().to_string(), "sensor offline");
    }
}
