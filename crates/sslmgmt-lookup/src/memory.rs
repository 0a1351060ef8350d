//! In-memory configuration store.

use std::collections::HashMap;

use serde_json::{json, Value};
use sslmgmt_core::{EntryKind, LookupError};

use crate::ConfigLookup;

/// Entries held in memory, keyed by kind and name.
#[derive(Debug, Clone, Default)]
pub struct MemoryLookup {
    entries: HashMap<(EntryKind, String), Value>,
}

impl MemoryLookup {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an entry with an arbitrary raw value.
    pub fn with_entry(mut self, kind: EntryKind, name: &str, value: Value) -> Self {
        self.insert(kind, name, value);
        self
    }

    /// Declare a CA whose value is its certificate string.
    pub fn with_ca(self, name: &str, cert: &str) -> Self {
        self.with_entry(EntryKind::Ca, name, Value::String(cert.to_string()))
    }

    /// Declare a certificate with both `cert` and `key` fields.
    pub fn with_cert(self, name: &str, cert: &str, key: &str) -> Self {
        self.with_entry(EntryKind::Cert, name, json!({ "cert": cert, "key": key }))
    }

    /// Declare or replace an entry in place.
    pub fn insert(&mut self, kind: EntryKind, name: &str, value: Value) {
        self.entries.insert((kind, name.to_string()), value);
    }
}

impl ConfigLookup for MemoryLookup {
    fn lookup(&self, kind: EntryKind, name: &str) -> Result<Option<Value>, LookupError> {
        Ok(self.entries.get(&(kind, name.to_string())).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_separate_namespaces() {
        let store = MemoryLookup::new().with_ca("shared", "cacert\n");
        assert!(store.lookup(EntryKind::Ca, "shared").unwrap().is_some());
        assert!(store.lookup(EntryKind::Cert, "shared").unwrap().is_none());
    }

    #[test]
    fn test_found_but_empty_is_distinct() {
        let store = MemoryLookup::new().with_entry(EntryKind::Cert, "empty", json!({}));
        assert_eq!(store.lookup(EntryKind::Cert, "empty").unwrap(), Some(json!({})));
        assert_eq!(store.lookup(EntryKind::Cert, "other").unwrap(), None);
    }
}
