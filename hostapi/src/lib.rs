//! `hostlink-hostapi` — host-side binding types for hostlink guest modules.
//!
//! This crate defines what a host provides when a guest module is
//! instantiated:
//!
//! - `HostBinding` trait — resolves a declared import to a host callable
//! - `HostFunc` — a shareable `() -> i32` host callable with its signature
//! - `BindingTable` — in-memory `HostBinding` keyed by `namespace::symbol`
//! - `ImportName`, `Signature`, `ValType` — the naming and typing vocabulary
//! - `ResolutionError`, `HostCallFailure` — host-side error types

pub mod error;
pub mod types;
pub mod traits;
pub mod binding_table;

// Re-export commonly used types at the crate root.
pub use error::{HostCallFailure, ResolutionError};
pub use types::{ImportName, Signature, ValType};
pub use traits::{HostBinding, HostFunc};
pub use binding_table::BindingTable;
