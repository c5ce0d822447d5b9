//! Signature and naming types shared by hosts and guest modules.
//!
//! An import is identified by a two-part [`ImportName`] and typed by a
//! [`Signature`]. Both are plain values: they are declared once when a
//! module is defined and compared during resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value types that may appear in a function signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValType {
    I32,
    I64,
    F32,
    F64,
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        };
        f.write_str(s)
    }
}

/// A function signature: ordered parameter types and ordered result types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<ValType>,
    pub results: Vec<ValType>,
}

impl Signature {
    pub fn new(params: Vec<ValType>, results: Vec<ValType>) -> Self {
        Self { params, results }
    }

    /// The `() -> i32` shape used by the host import contract.
    pub fn nullary_i32() -> Self {
        Self::new(vec![], vec![ValType::I32])
    }

    /// Returns true if this is exactly `() -> i32`.
    pub fn is_nullary_i32(&self) -> bool {
        self.params.is_empty() && self.results == [ValType::I32]
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, tys: &[ValType]) -> fmt::Result {
            f.write_str("(")?;
            for (i, ty) in tys.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", ty)?;
            }
            f.write_str(")")
        }
        list(f, &self.params)?;
        f.write_str(" -> ")?;
        list(f, &self.results)
    }
}

/// Two-part import name: `namespace::symbol`.
///
/// Ordering is lexicographic on `(namespace, symbol)` so binding tables
/// iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportName {
    pub namespace: String,
    pub symbol: String,
}

impl ImportName {
    pub fn new(namespace: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            symbol: symbol.into(),
        }
    }

    /// Both parts must be non-empty to be resolvable.
    pub fn is_valid(&self) -> bool {
        !self.namespace.is_empty() && !self.symbol.is_empty()
    }
}

impl fmt::Display for ImportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.namespace, self.symbol)
    }
}
