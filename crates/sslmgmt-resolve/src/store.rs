//! # PKI Store Layouts
//!
//! A store decides where files go and who owns them. Three kinds of
//! selection exist:
//!
//! - `default`: the built-in layout. Certificates in `/etc/pki/tls/certs`
//!   (`0644`), keys in `/etc/pki/tls/private` (`0600`), owner and group
//!   `root`.
//! - a named preset: a configured [`PkiStore`] with its own directories,
//!   ownership and modes.
//! - `custom`: the `default` layout with individual fields replaced by the
//!   request's `customstore` mapping.
//!
//! ## Custom Store Merge
//!
//! A custom store is a layered merge: start from the `default` record and
//! overwrite only the fields the mapping names. A custom certificate file
//! without a `group` still gets `root`; one without a `certfilename` still
//! lands in `/etc/pki/tls/certs`.
//!
//! ## Filenames
//!
//! Certificate files are named `<identifier>.pem`, or
//! `<identifier>-<chain>.pem` when a chain is appended. Key files are
//! always `<identifier>.pem` under the key directory.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sslmgmt_core::{FileMode, FileSpec};
use thiserror::Error;

use crate::request::{StoreSelection, CUSTOM_STORE, DEFAULT_STORE};

/// A named file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkiStore {
    /// Directory certificate files are written to.
    pub certdir: PathBuf,
    /// Directory private key files are written to.
    pub keydir: PathBuf,
    /// Owner of every planned file.
    pub owner: String,
    /// Group of every planned file.
    pub group: String,
    /// Mode of certificate files.
    pub certmode: FileMode,
    /// Mode of key files and one-file bundles.
    pub keymode: FileMode,
}

impl PkiStore {
    /// The built-in `default` layout.
    pub fn default_store() -> Self {
        Self {
            certdir: PathBuf::from("/etc/pki/tls/certs"),
            keydir: PathBuf::from("/etc/pki/tls/private"),
            owner: "root".to_string(),
            group: "root".to_string(),
            certmode: FileMode::CERT,
            keymode: FileMode::KEY,
        }
    }

    fn cert_spec(&self, filename: String) -> FileSpec {
        FileSpec {
            path: self.certdir.join(filename),
            owner: self.owner.clone(),
            group: self.group.clone(),
            mode: self.certmode,
        }
    }

    fn key_spec(&self, filename: String) -> FileSpec {
        FileSpec {
            path: self.keydir.join(filename),
            owner: self.owner.clone(),
            group: self.group.clone(),
            mode: self.keymode,
        }
    }
}

/// Error registering a preset.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreConfigError {
    /// `default` and `custom` cannot be redefined.
    #[error("pkistore name '{0}' is reserved")]
    ReservedName(String),
}

/// The set of presets a request may select by name.
///
/// Always contains `default`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkiStores {
    default: PkiStore,
    presets: BTreeMap<String, PkiStore>,
}

impl Default for PkiStores {
    fn default() -> Self {
        Self::new()
    }
}

impl PkiStores {
    /// A registry holding only the built-in `default` preset.
    pub fn new() -> Self {
        Self {
            default: PkiStore::default_store(),
            presets: BTreeMap::new(),
        }
    }

    /// Register an additional preset.
    pub fn insert(&mut self, name: &str, store: PkiStore) -> Result<(), StoreConfigError> {
        if name == DEFAULT_STORE || name == CUSTOM_STORE {
            return Err(StoreConfigError::ReservedName(name.to_string()));
        }
        self.presets.insert(name.to_string(), store);
        Ok(())
    }

    /// Whether `name` is a registered preset.
    pub fn contains(&self, name: &str) -> bool {
        name == DEFAULT_STORE || self.presets.contains_key(name)
    }

    /// Registered preset names: `default` first, the rest sorted.
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(DEFAULT_STORE)
            .chain(self.presets.keys().map(|s| s.as_str()))
            .collect()
    }

    /// Look up a preset by name.
    pub fn get(&self, name: &str) -> Option<&PkiStore> {
        if name == DEFAULT_STORE {
            Some(&self.default)
        } else {
            self.presets.get(name)
        }
    }

    /// The `default` preset.
    pub fn default_store(&self) -> &PkiStore {
        &self.default
    }

    fn preset_or_default(&self, name: &str) -> &PkiStore {
        self.get(name).unwrap_or_else(|| {
            tracing::warn!(pkistore = name, "unknown preset after validation; using default");
            &self.default
        })
    }
}

/// File layout of a certificate request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertLayout {
    /// Certificate (or certificate + chain) file.
    pub cert: FileSpec,
    /// Private key file; also the one-file bundle target.
    pub key: FileSpec,
}

/// Default certificate filename for `identifier` with an optional chain.
pub fn cert_filename(identifier: &str, chain: Option<&str>) -> String {
    match chain {
        Some(chain) => format!("{identifier}-{chain}.pem"),
        None => format!("{identifier}.pem"),
    }
}

/// Resolve the single file of a CA request.
pub fn ca_layout(stores: &PkiStores, identifier: &str, selection: &StoreSelection) -> FileSpec {
    let filename = cert_filename(identifier, None);
    match selection {
        StoreSelection::Preset(name) => stores.preset_or_default(name).cert_spec(filename),
        StoreSelection::Custom(custom) => {
            let mut spec = stores.default_store().cert_spec(filename);
            if let Some(path) = &custom.certfilename {
                spec.path = path.clone();
            }
            if let Some(owner) = &custom.owner {
                spec.owner = owner.clone();
            }
            if let Some(group) = &custom.group {
                spec.group = group.clone();
            }
            spec
        }
    }
}

/// Resolve the certificate and key files of a certificate request.
pub fn cert_layout(
    stores: &PkiStores,
    identifier: &str,
    chain: Option<&str>,
    selection: &StoreSelection,
) -> CertLayout {
    let cert_name = cert_filename(identifier, chain);
    let key_name = cert_filename(identifier, None);
    match selection {
        StoreSelection::Preset(name) => {
            let store = stores.preset_or_default(name);
            CertLayout {
                cert: store.cert_spec(cert_name),
                key: store.key_spec(key_name),
            }
        }
        StoreSelection::Custom(custom) => {
            let base = stores.default_store();
            let mut cert = base.cert_spec(cert_name);
            let mut key = base.key_spec(key_name);
            if let Some(path) = &custom.certfilename {
                cert.path = path.clone();
            }
            if let Some(path) = &custom.keyfilename {
                key.path = path.clone();
            }
            for spec in [&mut cert, &mut key] {
                if let Some(owner) = &custom.owner {
                    spec.owner = owner.clone();
                }
                if let Some(group) = &custom.group {
                    spec.group = group.clone();
                }
            }
            CertLayout { cert, key }
        }
    }
}
