//! # sslmgmt-lookup: Configuration Store Access
//!
//! The resolver never reads data files itself. It asks a [`ConfigLookup`]
//! for a named entry in one of two namespaces and receives either the raw
//! entry value or "not found". This keeps resolution testable against an
//! in-memory fake and lets deployments plug in any hierarchical store.
//!
//! ## Implementations
//!
//! - [`MemoryLookup`]: entries held in memory, built programmatically.
//!   The test fake for every resolver test.
//! - [`HieraLookup`]: an ordered hierarchy of YAML data files loaded once
//!   into a read-only snapshot, with `%{fact}` interpolation in level names.
//!
//! ## Contract
//!
//! `Ok(None)` means the name is not declared anywhere. `Ok(Some(value))`
//! means it is declared, even if `value` is null or an empty mapping; the
//! resolver decides whether that shape is acceptable.

pub mod hiera;
pub mod memory;
pub mod yaml;

use serde_json::Value;
use sslmgmt_core::{EntryKind, LookupError};

pub use hiera::{HieraLookup, Hierarchy};
pub use memory::MemoryLookup;
pub use yaml::{load_yaml_file, yaml_to_json_value};

/// Read-only access to CA and certificate entries by name.
pub trait ConfigLookup: Send + Sync {
    /// Look up `name` in the namespace for `kind`.
    fn lookup(&self, kind: EntryKind, name: &str) -> Result<Option<Value>, LookupError>;
}

impl<T: ConfigLookup + ?Sized> ConfigLookup for &T {
    fn lookup(&self, kind: EntryKind, name: &str) -> Result<Option<Value>, LookupError> {
        (**self).lookup(kind, name)
    }
}

impl<T: ConfigLookup + ?Sized> ConfigLookup for Box<T> {
    fn lookup(&self, kind: EntryKind, name: &str) -> Result<Option<Value>, LookupError> {
        (**self).lookup(kind, name)
    }
}
