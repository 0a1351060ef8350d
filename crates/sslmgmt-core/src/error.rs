//! # Error Types: Resolution Failure Taxonomy
//!
//! Defines the errors raised while validating parameters and planning
//! artifacts. All errors use `thiserror` for derive-based `Display` and
//! `Error` implementations.
//!
//! ## Design
//!
//! - Every variant carries the offending parameter or entry name.
//! - Enumerated parameters carry the accepted values so the message can be
//!   acted on without reading source.
//! - Reference failures name the configuration-store namespace the missing
//!   entry belongs in.
//! - Errors are terminal for one resolution: no variant is ever paired with
//!   a partial plan.

use std::path::PathBuf;

use thiserror::Error;

use crate::entry::EntryKind;

/// The value type a parameter or entry field was expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    /// A boolean (`true` / `false`, never a quoted string).
    Boolean,
    /// A mapping (hash) of string keys.
    Mapping,
    /// A string scalar.
    String,
}

impl std::fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Boolean => "Boolean",
            Self::Mapping => "Hash",
            Self::String => "String",
        };
        f.write_str(s)
    }
}

/// Failure of a single CA or certificate resolution.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A required parameter was absent, null, or empty.
    #[error("Must pass {parameter}")]
    MissingRequiredParameter {
        /// Name of the missing parameter.
        parameter: String,
    },

    /// A parameter carried a value outside its accepted set.
    #[error("{parameter} must be {expected}; got {value}")]
    InvalidEnum {
        /// Name of the offending parameter.
        parameter: String,
        /// Rendering of the rejected value.
        value: String,
        /// Human-readable description of the accepted set.
        expected: String,
        /// The accepted values.
        allowed: Vec<String>,
    },

    /// A parameter or entry field had the wrong value type.
    #[error("{subject} is not a {expected}: got {actual}")]
    TypeMismatch {
        /// Parameter name, `customstore.<key>`, or entry identifier.
        subject: String,
        /// Type that was required.
        expected: ExpectedType,
        /// Rendering of the rejected value.
        actual: String,
    },

    /// A referenced CA or certificate entry does not exist in the store.
    #[error("{kind} '{name}' not found: please ensure that {name} exists in hiera {namespace}")]
    UnresolvedReference {
        /// What referenced the entry (`ca`, `cert`, or `chain`).
        kind: String,
        /// Name that was looked up.
        name: String,
        /// Store namespace the entry should have been declared in.
        namespace: &'static str,
    },

    /// An entry exists but lacks a field the request needs.
    #[error("entry '{entry}' in hiera {namespace} is missing required field '{field}'")]
    MissingField {
        /// Entry identifier.
        entry: String,
        /// Field that is absent.
        field: String,
        /// Store namespace of the entry.
        namespace: &'static str,
    },

    /// A parameter not accepted by this entity kind was supplied.
    #[error("invalid parameter '{parameter}' for {kind} '{identifier}'; accepted parameters: {accepted}")]
    UnknownParameter {
        /// Unrecognized parameter name.
        parameter: String,
        /// Entity kind being resolved.
        kind: EntryKind,
        /// Identifier being resolved.
        identifier: String,
        /// Comma-separated accepted parameter names.
        accepted: String,
    },

    /// Two artifacts of one plan target the same path.
    #[error("{identifier}: more than one artifact targets {}", path.display())]
    DuplicatePath {
        /// Identifier being resolved.
        identifier: String,
        /// The colliding path.
        path: PathBuf,
    },

    /// The configuration store itself failed.
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

impl ResolveError {
    /// Build an `UnresolvedReference` for a missing entry of `kind`.
    ///
    /// `referrer` is the role the name played in the request, which differs
    /// from the entry kind for chain references (`chain` → `sslmgmt::ca`).
    pub fn unresolved(referrer: &str, kind: EntryKind, name: &str) -> Self {
        Self::UnresolvedReference {
            kind: referrer.to_string(),
            name: name.to_string(),
            namespace: kind.namespace(),
        }
    }

    /// Short, stable name of the variant, used as a structured log field.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingRequiredParameter { .. } => "missing_required_parameter",
            Self::InvalidEnum { .. } => "invalid_enum",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::UnresolvedReference { .. } => "unresolved_reference",
            Self::MissingField { .. } => "missing_field",
            Self::UnknownParameter { .. } => "unknown_parameter",
            Self::DuplicatePath { .. } => "duplicate_path",
            Self::Lookup(_) => "lookup",
        }
    }
}

/// Failure of the configuration store behind a lookup.
#[derive(Error, Debug)]
pub enum LookupError {
    /// A data file could not be read.
    #[error("cannot read data file {}: {source}", path.display())]
    Read {
        /// Path of the data file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A data file is not valid YAML.
    #[error("invalid YAML in {}: {source}", path.display())]
    Parse {
        /// Path of the data file.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_yaml::Error,
    },

    /// A data file has a structure the store cannot interpret.
    #[error("malformed data in {}: {detail}", path.display())]
    Malformed {
        /// Path of the data file.
        path: PathBuf,
        /// What was wrong.
        detail: String,
    },
}
