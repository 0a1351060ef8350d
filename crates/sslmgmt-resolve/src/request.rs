//! # Validated Requests
//!
//! The typed form of a parameter set after [`crate::validate`] has
//! accepted it. Nothing downstream of validation inspects raw JSON
//! parameters again.

use std::path::PathBuf;

use serde_json::{Map, Value};
use sslmgmt_core::EnsureState;

/// Raw caller-supplied parameters, keyed by parameter name.
pub type Params = Map<String, Value>;

/// Name of the layout selection that takes a caller-supplied store.
pub const CUSTOM_STORE: &str = "custom";

/// Name of the built-in layout every other layout falls back to.
pub const DEFAULT_STORE: &str = "default";

/// Which layout a request resolves against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSelection {
    /// A named preset, `default` included.
    Preset(String),
    /// Caller-supplied overrides on top of the `default` preset.
    Custom(CustomStore),
}

/// Overrides from a `customstore` mapping. `None` falls back to `default`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomStore {
    /// Full path of the certificate file.
    pub certfilename: Option<PathBuf>,
    /// Full path of the private key file (certificates only).
    pub keyfilename: Option<PathBuf>,
    /// Owner of every file the request plans.
    pub owner: Option<String>,
    /// Group of every file the request plans.
    pub group: Option<String>,
}

/// A validated CA resolution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaRequest {
    /// CA name: lookup key and filename stem.
    pub identifier: String,
    /// Layout to resolve against.
    pub store: StoreSelection,
    /// Desired state of the CA file.
    pub ensure: EnsureState,
}

/// A validated certificate resolution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertRequest {
    /// Certificate name: lookup key and filename stem.
    pub identifier: String,
    /// Layout to resolve against.
    pub store: StoreSelection,
    /// Desired state of every planned file.
    pub ensure: EnsureState,
    /// CA appended after the certificate, if any.
    pub chain: Option<String>,
    /// Whether a separate key file is planned.
    pub installkey: bool,
    /// Whether key and certificate share one file at the key path.
    pub onefile: bool,
}

impl CertRequest {
    /// Whether the entry's `key` field is needed to plan this request.
    ///
    /// One-file mode always embeds the key, whatever `installkey` says.
    pub fn requires_key(&self) -> bool {
        self.onefile || self.installkey
    }
}
