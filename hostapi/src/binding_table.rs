//! In-memory binding table.
//!
//! `BindingTable` implements `HostBinding` as a fixed arena: callables live
//! in a `Vec` and a `BTreeMap` maps each import name to its slot. Lookups
//! happen once at instantiation; after that the guest holds the callable
//! directly.

use std::collections::BTreeMap;

use crate::error::ResolutionError;
use crate::traits::{HostBinding, HostFunc};
use crate::types::{ImportName, Signature};

/// Name → callable table backed by an arena of host functions.
///
/// `BTreeMap` keeps name iteration deterministic.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    funcs: Vec<HostFunc>,
    index: BTreeMap<ImportName, usize>,
}

impl BindingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `namespace::symbol` to a callable. Redefining a name replaces
    /// the previous callable in place.
    pub fn define(
        &mut self,
        namespace: impl Into<String>,
        symbol: impl Into<String>,
        func: HostFunc,
    ) -> &mut Self {
        let name = ImportName::new(namespace, symbol);
        match self.index.get(&name) {
            Some(&slot) => self.funcs[slot] = func,
            None => {
                self.index.insert(name, self.funcs.len());
                self.funcs.push(func);
            }
        }
        self
    }

    /// Bind a `() -> i32` closure.
    pub fn define_i32<F>(
        &mut self,
        namespace: impl Into<String>,
        symbol: impl Into<String>,
        f: F,
    ) -> &mut Self
    where
        F: Fn() -> anyhow::Result<i32> + Send + Sync + 'static,
    {
        self.define(namespace, symbol, HostFunc::new(f))
    }

    /// Look up a binding without checking its signature.
    pub fn get(&self, name: &ImportName) -> Option<&HostFunc> {
        self.index.get(name).map(|&slot| &self.funcs[slot])
    }

    pub fn contains(&self, name: &ImportName) -> bool {
        self.index.contains_key(name)
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &ImportName> {
        self.index.keys()
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl HostBinding for BindingTable {
    fn resolve(&self, name: &ImportName, expected: &Signature) -> Result<HostFunc, ResolutionError> {
        if !name.is_valid() {
            return Err(ResolutionError::EmptyName(name.clone()));
        }
        let func = self
            .get(name)
            .ok_or_else(|| ResolutionError::NotFound(name.clone()))?;
        if func.signature() != expected {
            return Err(ResolutionError::SignatureMismatch {
                name: name.clone(),
                expected: expected.clone(),
                found: func.signature().clone(),
            });
        }
        Ok(func.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValType;

    fn get_number() -> ImportName {
        ImportName::new("env", "get_number")
    }

    #[test]
    fn test_empty_table() {
        let table = BindingTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert!(!table.contains(&get_number()));
        let err = table.resolve(&get_number(), &Signature::nullary_i32()).unwrap_err();
        assert_eq!(err, ResolutionError::NotFound(get_number()));
    }

    #[test]
    fn test_define_and_resolve() {
        let mut table = BindingTable::new();
        table.define_i32("env", "get_number", || Ok(10));

        assert!(table.contains(&get_number()));
        assert_eq!(table.len(), 1);
        let f = table.resolve(&get_number(), &Signature::nullary_i32()).unwrap();
        assert_eq!(f.call().unwrap(), 10);
    }

    #[test]
    fn test_redefine_replaces_in_place() {
        let mut table = BindingTable::new();
        table.define_i32("env", "get_number", || Ok(1));
        table.define_i32("env", "get_number", || Ok(2));

        assert_eq!(table.len(), 1);
        let f = table.resolve(&get_number(), &Signature::nullary_i32()).unwrap();
        assert_eq!(f.call().unwrap(), 2);
    }

    #[test]
    fn test_wrong_namespace_not_found() {
        let mut table = BindingTable::new();
        table.define_i32("host", "get_number", || Ok(1));
        let err = table.resolve(&get_number(), &Signature::nullary_i32()).unwrap_err();
        assert!(matches!(err, ResolutionError::NotFound(_)));
    }

    #[test]
    fn test_signature_mismatch() {
        let mut table = BindingTable::new();
        let sig = Signature::new(vec![], vec![ValType::I64]);
        table.define("env", "get_number", HostFunc::with_signature(sig.clone(), || Ok(0)));

        let err = table.resolve(&get_number(), &Signature::nullary_i32()).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::SignatureMismatch {
                name: get_number(),
                expected: Signature::nullary_i32(),
                found: sig,
            }
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut table = BindingTable::new();
        table.define_i32("", "get_number", || Ok(0));
        let name = ImportName::new("", "get_number");
        let err = table.resolve(&name, &Signature::nullary_i32()).unwrap_err();
        assert_eq!(err, ResolutionError::EmptyName(name));
    }

    #[test]
    fn test_names_sorted() {
        let mut table = BindingTable::new();
        table
            .define_i32("env", "z", || Ok(0))
            .define_i32("env", "a", || Ok(0))
            .define_i32("aux", "m", || Ok(0));
        let names: Vec<String> = table.names().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["aux::m", "env::a", "env::z"]);
    }
}
