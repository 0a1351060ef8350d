//! # Resolution Properties
//!
//! End-to-end checks of [`Resolver`] against an in-memory store holding
//! the fixtures used throughout: CA `testca` (`"cacert\n"`) and certificate
//! `test_certificate` (`"testcert\n"` / `"testkey\n"`).

use std::path::{Path, PathBuf};

use proptest::prelude::*;
use serde_json::{json, Value};
use sslmgmt_core::{EnsureState, EntryKind, ExpectedType, FileMode, ResolveError};
use sslmgmt_lookup::MemoryLookup;
use sslmgmt_resolve::{Params, PkiStore, PkiStores, Resolver};

const CERT_PATH: &str = "/etc/pki/tls/certs/test_certificate.pem";
const KEY_PATH: &str = "/etc/pki/tls/private/test_certificate.pem";

fn fixtures() -> MemoryLookup {
    MemoryLookup::new()
        .with_ca("testca", "cacert\n")
        .with_cert("test_certificate", "testcert\n", "testkey\n")
        .with_entry(EntryKind::Cert, "keyless", json!({"cert": "keyless\n"}))
}

fn resolver() -> Resolver<MemoryLookup> {
    Resolver::new(fixtures(), PkiStores::new())
}

fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected a JSON object, got: {other}"),
    }
}

fn content_of(plan: &sslmgmt_core::ArtifactPlan, path: &str) -> Vec<u8> {
    plan.target(Path::new(path))
        .and_then(|a| a.content.as_ref())
        .map(|c| c.as_bytes().to_vec())
        .unwrap_or_else(|| panic!("no present artifact at {path}"))
}

// ─── Fixed Scenarios ─────────────────────────────────────────────────

#[test]
fn test_ca_round_trip_default_store() {
    let plan = resolver()
        .resolve_ca("testca", &params(json!({"pkistore": "default"})))
        .unwrap();

    assert_eq!(plan.len(), 1);
    let artifact = &plan.artifacts()[0];
    assert_eq!(artifact.path, PathBuf::from("/etc/pki/tls/certs/testca.pem"));
    assert_eq!(artifact.mode, FileMode::CERT);
    assert_eq!(artifact.mode.to_string(), "0644");
    assert_eq!(artifact.owner, "root");
    assert_eq!(artifact.group, "root");
    assert_eq!(artifact.ensure, EnsureState::Present);
    assert_eq!(artifact.content.as_ref().unwrap().as_bytes(), b"cacert\n");
}

#[test]
fn test_chain_composition() {
    let plan = resolver()
        .resolve_cert(
            "test_certificate",
            &params(json!({"pkistore": "default", "chain": "testca", "installkey": false})),
        )
        .unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(
        plan.artifacts()[0].path,
        PathBuf::from("/etc/pki/tls/certs/test_certificate-testca.pem")
    );
    assert_eq!(
        content_of(&plan, "/etc/pki/tls/certs/test_certificate-testca.pem"),
        b"testcert\ncacert\n"
    );
}

#[test]
fn test_onefile_bundle_at_private_path() {
    let plan = resolver()
        .resolve_cert(
            "test_certificate",
            &params(json!({"pkistore": "default", "onefile": true})),
        )
        .unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(content_of(&plan, KEY_PATH), b"testkey\ntestcert\n");
    assert!(plan.target(Path::new(CERT_PATH)).is_none());
    assert_eq!(plan.artifacts()[0].mode, FileMode::KEY);
}

#[test]
fn test_installkey_false_suppresses_key() {
    let plan = resolver()
        .resolve_cert(
            "test_certificate",
            &params(json!({"pkistore": "default", "installkey": false})),
        )
        .unwrap();

    assert!(plan.target(Path::new(KEY_PATH)).is_none());
    assert!(plan
        .artifacts()
        .iter()
        .all(|a| !a.path.starts_with("/etc/pki/tls/private")));
    assert_eq!(content_of(&plan, CERT_PATH), b"testcert\n");
}

#[test]
fn test_missing_chain_names_reference() {
    let err = resolver()
        .resolve_cert(
            "test_certificate",
            &params(json!({"pkistore": "default", "chain": "badchain"})),
        )
        .unwrap_err();

    assert!(matches!(err, ResolveError::UnresolvedReference { .. }));
    assert!(err.to_string().contains("badchain"));
}

#[test]
fn test_missing_ca_wording() {
    let err = resolver()
        .resolve_ca("bad_certificate", &params(json!({"pkistore": "default"})))
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("please ensure that bad_certificate exists in hiera sslmgmt::ca"));
}

#[test]
fn test_custom_store_not_mapping() {
    let err = resolver()
        .resolve_cert(
            "test_certificate",
            &params(json!({"pkistore": "custom", "customStore": "/tmp/cert.pem"})),
        )
        .unwrap_err();
    match err {
        ResolveError::TypeMismatch { expected, .. } => {
            assert_eq!(expected, ExpectedType::Mapping);
        }
        other => panic!("Expected TypeMismatch, got: {other}"),
    }
}

#[test]
fn test_custom_store_mapping_message() {
    let err = resolver()
        .resolve_ca(
            "testca",
            &params(json!({"pkistore": "custom", "customstore": ["a"]})),
        )
        .unwrap_err();
    assert!(err.to_string().contains("is not a Hash"));
}

#[test]
fn test_custom_store_overrides() {
    let plan = resolver()
        .resolve_cert(
            "test_certificate",
            &params(json!({
                "pkistore": "custom",
                "customstore": {
                    "certfilename": "/srv/tls/site.crt",
                    "keyfilename": "/srv/tls/site.key",
                    "owner": "www",
                }
            })),
        )
        .unwrap();

    assert_eq!(content_of(&plan, "/srv/tls/site.crt"), b"testcert\n");
    assert_eq!(content_of(&plan, "/srv/tls/site.key"), b"testkey\n");
    for artifact in plan.artifacts() {
        assert_eq!(artifact.owner, "www");
        assert_eq!(artifact.group, "root");
    }
}

#[test]
fn test_ca_custom_store_layout() {
    let plan = resolver()
        .resolve_ca(
            "testca",
            &params(json!({
                "pkistore": "custom",
                "customstore": {
                    "certfilename": "/random/filepath/customfile.pem",
                    "keyfilename": "/random/filepath/customkey.pem",
                    "owner": "randomowner",
                    "group": "randomgroup",
                }
            })),
        )
        .unwrap();

    assert_eq!(plan.len(), 1);
    let artifact = &plan.artifacts()[0];
    assert_eq!(artifact.path, PathBuf::from("/random/filepath/customfile.pem"));
    assert_eq!(artifact.owner, "randomowner");
    assert_eq!(artifact.group, "randomgroup");
    assert_eq!(artifact.mode.to_string(), "0644");
    assert_eq!(artifact.ensure, EnsureState::Present);
    assert_eq!(content_of(&plan, "/random/filepath/customfile.pem"), b"cacert\n");
    assert!(plan.target(Path::new("/random/filepath/customkey.pem")).is_none());
}

#[test]
fn test_missing_key_field() {
    let err = resolver()
        .resolve_cert("keyless", &params(json!({"pkistore": "default"})))
        .unwrap_err();
    match err {
        ResolveError::MissingField { entry, field, .. } => {
            assert_eq!(entry, "keyless");
            assert_eq!(field, "key");
        }
        other => panic!("Expected MissingField, got: {other}"),
    }

    let plan = resolver()
        .resolve_cert(
            "keyless",
            &params(json!({"pkistore": "default", "installkey": false})),
        )
        .unwrap();
    assert_eq!(plan.len(), 1);
}

#[test]
fn test_missing_pkistore_message() {
    let err = resolver()
        .resolve_cert("test_certificate", &params(json!({})))
        .unwrap_err();
    assert_eq!(err.to_string(), "Must pass pkistore");
}

#[test]
fn test_invalid_pkistore_message() {
    let err = resolver()
        .resolve_ca("testca", &params(json!({"pkistore": "bogus"})))
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("pkistore must be either custom or a value from params"));
}

#[test]
fn test_ensure_messages_differ_by_kind() {
    let ca = resolver()
        .resolve_ca("testca", &params(json!({"pkistore": "default", "ensure": "bogus"})))
        .unwrap_err();
    assert!(ca
        .to_string()
        .contains("ensure must be one of 'present', or 'absent'"));

    let cert = resolver()
        .resolve_cert(
            "test_certificate",
            &params(json!({"pkistore": "default", "ensure": "bogus"})),
        )
        .unwrap_err();
    assert!(cert
        .to_string()
        .contains("ensure must be one of true, false, 'present', or 'absent'"));
}

#[test]
fn test_absent_needs_no_entry() {
    let plan = resolver()
        .resolve_cert(
            "never_stored",
            &params(json!({"pkistore": "default", "ensure": "absent"})),
        )
        .unwrap();
    assert_eq!(plan.len(), 2);
    assert!(plan
        .artifacts()
        .iter()
        .all(|a| a.ensure == EnsureState::Absent && a.content.is_none()));
}

#[test]
fn test_named_preset() {
    let mut stores = PkiStores::new();
    stores
        .insert(
            "web",
            PkiStore {
                certdir: PathBuf::from("/etc/nginx/ssl"),
                keydir: PathBuf::from("/etc/nginx/ssl/private"),
                owner: "root".into(),
                group: "nginx".into(),
                certmode: FileMode::CERT,
                keymode: FileMode::new(0o640).unwrap(),
            },
        )
        .unwrap();
    let resolver = Resolver::new(fixtures(), stores);

    let plan = resolver
        .resolve(
            EntryKind::Cert,
            "test_certificate",
            &params(json!({"pkistore": "web"})),
        )
        .unwrap();
    assert_eq!(
        content_of(&plan, "/etc/nginx/ssl/private/test_certificate.pem"),
        b"testkey\n"
    );
    assert!(plan
        .artifacts()
        .iter()
        .all(|a| a.group == "nginx"));
}

#[test]
fn test_resolver_is_shareable_across_threads() {
    let resolver = std::sync::Arc::new(resolver());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let resolver = resolver.clone();
            std::thread::spawn(move || {
                resolver
                    .resolve_ca("testca", &params(json!({"pkistore": "default"})))
                    .map(|plan| plan.len())
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 1);
    }
}

// ─── Properties ──────────────────────────────────────────────────────

fn non_bool() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z]{0,8}".prop_map(Value::String),
        any::<i64>().prop_map(|n| json!(n)),
        Just(json!([])),
        Just(json!({})),
    ]
}

fn pem_like() -> impl Strategy<Value = String> {
    "[A-Za-z0-9+/=]{1,40}\n?"
}

proptest! {
    #[test]
    fn prop_missing_pkistore_always_fails(
        ensure in prop_oneof![Just("present"), Just("absent")],
        chain in proptest::option::of("[a-z]{1,8}"),
    ) {
        let mut p = params(json!({"ensure": ensure}));
        if let Some(chain) = chain {
            p.insert("chain".into(), json!(chain));
        }
        let err = resolver().resolve_cert("test_certificate", &p).unwrap_err();
        let is_missing = matches!(err, ResolveError::MissingRequiredParameter { .. });
        prop_assert!(is_missing);
    }

    #[test]
    fn prop_unknown_pkistore_always_invalid(name in "[a-z]{1,12}") {
        prop_assume!(name != "default" && name != "custom");
        let err = resolver()
            .resolve_ca("testca", &params(json!({"pkistore": name})))
            .unwrap_err();
        let is_invalid = matches!(err, ResolveError::InvalidEnum { .. });
        prop_assert!(is_invalid);
    }

    #[test]
    fn prop_non_boolean_flags_rejected(
        flag in prop_oneof![Just("installkey"), Just("onefile")],
        value in non_bool(),
    ) {
        let mut p = params(json!({"pkistore": "default"}));
        p.insert(flag.to_string(), value);
        let err = resolver().resolve_cert("test_certificate", &p).unwrap_err();
        let is_mismatch = matches!(
            err,
            ResolveError::TypeMismatch { expected: ExpectedType::Boolean, .. }
        );
        prop_assert!(is_mismatch);
    }

    #[test]
    fn prop_composition_order(cert in pem_like(), key in pem_like(), ca in pem_like()) {
        let lookup = MemoryLookup::new()
            .with_ca("chainca", &ca)
            .with_cert("site", &cert, &key);
        let resolver = Resolver::new(lookup, PkiStores::new());
        let plan = resolver
            .resolve_cert(
                "site",
                &params(json!({"pkistore": "default", "chain": "chainca", "onefile": true})),
            )
            .unwrap();
        let bundle = String::from_utf8(content_of(&plan, "/etc/pki/tls/private/site.pem")).unwrap();

        let expected = format!(
            "{}\n{}\n{}\n",
            key.trim_end_matches('\n'),
            cert.trim_end_matches('\n'),
            ca.trim_end_matches('\n'),
        );
        prop_assert_eq!(bundle, expected);
    }
}
