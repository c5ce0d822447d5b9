//! `hostlink-sandbox` — Wasmtime-backed guest modules with one host import
//! and one export.
//!
//! This crate defines, validates, instantiates and invokes guest modules. It
//! enforces:
//!
//! - **Contract validation:** exactly one `() -> i32` import, exactly one
//!   `() -> i32` export, well-typed function bodies, no memory, table or
//!   global sections, whether the guest comes from a definition or a
//!   compiled binary
//! - **Single resolution:** imports are bound once, at instantiation, through
//!   a [`HostBinding`](hostlink_hostapi::HostBinding)
//! - **Explicit lifecycle:** instances are owned values that move through
//!   `Unresolved → Instantiated | Failed`
//! - **Wraparound arithmetic:** guest `i32` math wraps modulo 2^32
//!
//! The canonical guest is [`ModuleDefinition::add_five_to_imported`]:
//!
//! ```
//! use hostlink_hostapi::BindingTable;
//! use hostlink_sandbox::{ModuleDefinition, Sandbox, SandboxConfig};
//!
//! let sandbox = Sandbox::new(
//!     ModuleDefinition::add_five_to_imported(),
//!     SandboxConfig::default(),
//! )?;
//!
//! let mut host = BindingTable::new();
//! host.define_i32("env", "get_number", || Ok(10));
//!
//! let mut instance = sandbox.instantiate(&host)?;
//! assert_eq!(instance.invoke_export("add_five_to_imported", &[])?, 15);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod binary;
pub mod config;
pub mod definition;
pub mod host_impl;
pub mod validation;
pub mod linker;
pub mod runtime;

pub use error::{InvocationError, SandboxError};
pub use config::SandboxConfig;
pub use definition::{ModuleDefinition, ModuleId};
pub use runtime::{Instance, InstanceState, Sandbox};
