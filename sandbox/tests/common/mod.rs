//! Shared test helpers for integration tests.
//!
//! Provides host binding builders and a sandbox factory for the canonical
//! `add_five_to_imported` guest, used across all integration test files.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;

use hostlink_hostapi::BindingTable;
use hostlink_sandbox::{ModuleDefinition, Sandbox, SandboxConfig};

/// Export name of the canonical guest.
pub const EXPORT: &str = "add_five_to_imported";

/// Host values at and around the i32 boundaries.
pub const SAMPLE_VALUES: &[i32] = &[
    i32::MIN,
    i32::MIN + 1,
    -1_000_000,
    -6,
    -5,
    -1,
    0,
    1,
    10,
    42,
    1_000_000,
    i32::MAX - 5,
    i32::MAX - 4,
    i32::MAX - 1,
    i32::MAX,
];

// ── Sandbox Loaders ──

/// Compile the canonical guest with default config.
pub fn load_sandbox() -> Sandbox {
    Sandbox::new(
        ModuleDefinition::add_five_to_imported(),
        SandboxConfig::default(),
    )
    .expect("canonical guest must compile")
}

// ── Host Binding Builders ──

/// Host whose `env::get_number` always returns `value`.
pub fn constant_host(value: i32) -> BindingTable {
    let mut table = BindingTable::new();
    table.define_i32("env", "get_number", move || Ok(value));
    table
}

/// Host returning `value` that counts how often it was called.
pub fn counting_host(value: i32) -> (BindingTable, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut table = BindingTable::new();
    table.define_i32("env", "get_number", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    });
    (table, calls)
}

/// Host returning `start`, `start + 1`, ... on successive calls.
pub fn sequence_host(start: i32) -> BindingTable {
    let next = Arc::new(AtomicI32::new(start));
    let mut table = BindingTable::new();
    table.define_i32("env", "get_number", move || {
        Ok(next.fetch_add(1, Ordering::SeqCst))
    });
    table
}

/// Host whose `env::get_number` always fails with `message`.
pub fn failing_host(message: &'static str) -> BindingTable {
    let mut table = BindingTable::new();
    table.define_i32("env", "get_number", move || Err(anyhow::anyhow!(message)));
    table
}
