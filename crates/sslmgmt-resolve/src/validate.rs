//! # Parameter Validation
//!
//! Turns a raw parameter set into a [`CaRequest`] or [`CertRequest`]
//! before any lookup happens. Validation is a pure function of the
//! parameters and the set of known presets.
//!
//! ## Rule Order
//!
//! Rules are evaluated in a fixed order and the first failure wins:
//!
//! 1. `pkistore` present and non-empty.
//! 2. `pkistore` is `custom` or a known preset.
//! 3. `ensure` is a value accepted for the entity kind.
//! 4. `installkey` / `onefile` are booleans (certificates only).
//! 5. With `pkistore: custom`, `customstore` is a mapping of strings.
//! 6. `chain` is a string (certificates only).
//! 7. No parameter outside the accepted set for the entity kind.
//!
//! A missing `pkistore` always fails here, before planning. There is no
//! deferred failure at materialization time.

use std::path::PathBuf;

use serde_json::Value;
use sslmgmt_core::{EnsureState, EntryKind, ExpectedType, ResolveError};

use crate::request::{
    CaRequest, CertRequest, CustomStore, Params, StoreSelection, CUSTOM_STORE,
};
use crate::store::PkiStores;

const PKISTORE: &str = "pkistore";
const ENSURE: &str = "ensure";
const CUSTOMSTORE: &str = "customstore";
const CUSTOMSTORE_ALIAS: &str = "customStore";
const CHAIN: &str = "chain";
const INSTALLKEY: &str = "installkey";
const ONEFILE: &str = "onefile";

const CA_PARAMS: &[&str] = &[PKISTORE, ENSURE, CUSTOMSTORE, CUSTOMSTORE_ALIAS];
const CERT_PARAMS: &[&str] = &[
    PKISTORE,
    ENSURE,
    CUSTOMSTORE,
    CUSTOMSTORE_ALIAS,
    CHAIN,
    INSTALLKEY,
    ONEFILE,
];

const CA_CUSTOM_KEYS: &[&str] = &["certfilename", "owner", "group"];
const CERT_CUSTOM_KEYS: &[&str] = &["certfilename", "keyfilename", "owner", "group"];

/// Validate the parameters of a CA resolution.
pub fn validate_ca(
    identifier: &str,
    params: &Params,
    stores: &PkiStores,
) -> Result<CaRequest, ResolveError> {
    let pkistore = require_pkistore(params, stores)?;
    let ensure = ca_ensure(params)?;
    let store = store_selection(pkistore, params, EntryKind::Ca)?;
    reject_unknown(identifier, params, EntryKind::Ca)?;

    Ok(CaRequest {
        identifier: identifier.to_string(),
        store,
        ensure,
    })
}

/// Validate the parameters of a certificate resolution.
pub fn validate_cert(
    identifier: &str,
    params: &Params,
    stores: &PkiStores,
) -> Result<CertRequest, ResolveError> {
    let pkistore = require_pkistore(params, stores)?;
    let ensure = cert_ensure(params)?;
    let installkey = optional_bool(params, INSTALLKEY)?.unwrap_or(true);
    let onefile = optional_bool(params, ONEFILE)?.unwrap_or(false);
    let store = store_selection(pkistore, params, EntryKind::Cert)?;
    let chain = chain(params)?;
    reject_unknown(identifier, params, EntryKind::Cert)?;

    if onefile && !installkey {
        tracing::debug!(identifier, "onefile overrides installkey=false; key is embedded");
    }

    Ok(CertRequest {
        identifier: identifier.to_string(),
        store,
        ensure,
        chain,
        installkey,
        onefile,
    })
}

// ─── Rules ───────────────────────────────────────────────────────────

/// Rules 1 and 2.
fn require_pkistore<'a>(params: &'a Params, stores: &PkiStores) -> Result<&'a str, ResolveError> {
    let value = match params.get(PKISTORE) {
        None | Some(Value::Null) => return Err(missing(PKISTORE)),
        Some(Value::String(s)) if s.is_empty() => return Err(missing(PKISTORE)),
        Some(v) => v,
    };

    let mut allowed = vec![CUSTOM_STORE.to_string()];
    allowed.extend(stores.names().into_iter().map(str::to_string));

    match value {
        Value::String(s) if s == CUSTOM_STORE || stores.contains(s) => Ok(s.as_str()),
        other => Err(ResolveError::InvalidEnum {
            parameter: PKISTORE.to_string(),
            value: render(other),
            expected: format!(
                "either custom or a value from params ({})",
                stores.names().join(", ")
            ),
            allowed,
        }),
    }
}

/// Rule 3 for CAs: `present` or `absent`, default `present`.
fn ca_ensure(params: &Params) -> Result<EnsureState, ResolveError> {
    match params.get(ENSURE) {
        None | Some(Value::Null) => Ok(EnsureState::Present),
        Some(Value::String(s)) if s == "present" => Ok(EnsureState::Present),
        Some(Value::String(s)) if s == "absent" => Ok(EnsureState::Absent),
        Some(other) => Err(ResolveError::InvalidEnum {
            parameter: ENSURE.to_string(),
            value: render(other),
            expected: "one of 'present', or 'absent'".to_string(),
            allowed: vec!["present".to_string(), "absent".to_string()],
        }),
    }
}

/// Rule 3 for certificates: booleans or `true`/`false`/`present`/`absent`.
fn cert_ensure(params: &Params) -> Result<EnsureState, ResolveError> {
    let present = match params.get(ENSURE) {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s == "true" || s == "present" => true,
        Some(Value::String(s)) if s == "false" || s == "absent" => false,
        Some(other) => {
            return Err(ResolveError::InvalidEnum {
                parameter: ENSURE.to_string(),
                value: render(other),
                expected: "one of true, false, 'present', or 'absent'".to_string(),
                allowed: ["true", "false", "present", "absent"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            })
        }
    };
    Ok(if present {
        EnsureState::Present
    } else {
        EnsureState::Absent
    })
}

/// Rule 4: a JSON boolean, never a quoted string.
fn optional_bool(params: &Params, name: &str) -> Result<Option<bool>, ResolveError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(ResolveError::TypeMismatch {
            subject: name.to_string(),
            expected: ExpectedType::Boolean,
            actual: render(other),
        }),
    }
}

/// Rule 5.
fn store_selection(
    pkistore: &str,
    params: &Params,
    kind: EntryKind,
) -> Result<StoreSelection, ResolveError> {
    let raw = params.get(CUSTOMSTORE).or_else(|| params.get(CUSTOMSTORE_ALIAS));

    if pkistore != CUSTOM_STORE {
        if raw.is_some_and(|v| !v.is_null()) {
            tracing::debug!(pkistore, "customstore ignored for non-custom pkistore");
        }
        return Ok(StoreSelection::Preset(pkistore.to_string()));
    }

    let map = match raw {
        Some(Value::Object(map)) => map,
        other => {
            return Err(ResolveError::TypeMismatch {
                subject: CUSTOMSTORE.to_string(),
                expected: ExpectedType::Mapping,
                actual: other.map(render).unwrap_or_else(|| "undef".to_string()),
            })
        }
    };

    let accepted = match kind {
        EntryKind::Ca => CA_CUSTOM_KEYS,
        EntryKind::Cert => CERT_CUSTOM_KEYS,
    };
    for key in map.keys() {
        if !accepted.contains(&key.as_str()) {
            tracing::warn!(key = %key, kind = %kind, "ignoring unrecognized customstore key");
        }
    }

    let field = |name: &str| -> Result<Option<String>, ResolveError> {
        if !accepted.contains(&name) {
            return Ok(None);
        }
        match map.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(ResolveError::TypeMismatch {
                subject: format!("{CUSTOMSTORE}.{name}"),
                expected: ExpectedType::String,
                actual: render(other),
            }),
        }
    };

    Ok(StoreSelection::Custom(CustomStore {
        certfilename: field("certfilename")?.map(PathBuf::from),
        keyfilename: field("keyfilename")?.map(PathBuf::from),
        owner: field("owner")?,
        group: field("group")?,
    }))
}

/// Rule 6. An empty string means no chain.
fn chain(params: &Params) -> Result<Option<String>, ResolveError> {
    match params.get(CHAIN) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ResolveError::TypeMismatch {
            subject: CHAIN.to_string(),
            expected: ExpectedType::String,
            actual: render(other),
        }),
    }
}

/// Rule 7.
fn reject_unknown(identifier: &str, params: &Params, kind: EntryKind) -> Result<(), ResolveError> {
    let accepted = match kind {
        EntryKind::Ca => CA_PARAMS,
        EntryKind::Cert => CERT_PARAMS,
    };
    match params.keys().find(|k| !accepted.contains(&k.as_str())) {
        Some(parameter) => Err(ResolveError::UnknownParameter {
            parameter: parameter.clone(),
            kind,
            identifier: identifier.to_string(),
            accepted: accepted
                .iter()
                .filter(|p| **p != CUSTOMSTORE_ALIAS)
                .copied()
                .collect::<Vec<_>>()
                .join(", "),
        }),
        None => Ok(()),
    }
}

fn missing(parameter: &str) -> ResolveError {
    ResolveError::MissingRequiredParameter {
        parameter: parameter.to_string(),
    }
}

/// Render a rejected value for an error message.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() => "\"\"".to_string(),
        other => other.to_string(),
    }
}
