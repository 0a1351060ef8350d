//! # Host Manifests
//!
//! A manifest lists the CAs and certificates one host carries:
//!
//! ```yaml
//! ca:
//!   testca: { pkistore: default }
//! certs:
//!   test_certificate: { pkistore: default, chain: testca }
//! ```
//!
//! Resources resolve independently, CAs first, each section in file
//! order. A failing resource is reported and the rest still resolve, but
//! a manifest is only applied when every resource resolved and no two
//! resources target the same path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sslmgmt_core::{ArtifactPlan, EntryKind, ResolveError};
use sslmgmt_lookup::{yaml_to_json_value, ConfigLookup};
use sslmgmt_resolve::{Params, Resolver};

/// Manifest loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("malformed manifest: {0}")]
    Malformed(String),
}

/// One CA or certificate to resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub kind: EntryKind,
    /// Entry name looked up in the data hierarchy.
    pub name: String,
    /// Raw parameters, validated only at resolution time.
    pub params: Params,
}

/// The resources of one host, in resolution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub resources: Vec<Resource>,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_yaml(yaml)
    }

    /// Build a manifest from a parsed YAML document.
    pub fn from_yaml(yaml: serde_yaml::Value) -> Result<Self, ManifestError> {
        let mut top = match yaml {
            serde_yaml::Value::Null => return Ok(Self::default()),
            serde_yaml::Value::Mapping(map) => map,
            other => {
                return Err(ManifestError::Malformed(format!(
                    "top level must be a mapping, got {}",
                    kind_name(&other)
                )))
            }
        };

        let mut resources = Vec::new();
        for (section, kind) in [("ca", EntryKind::Ca), ("certs", EntryKind::Cert)] {
            if let Some(value) = top.remove(section) {
                resources.extend(section_resources(section, kind, value)?);
            }
        }

        if let Some((key, _)) = top.into_iter().next() {
            return Err(ManifestError::Malformed(format!(
                "unknown section {}",
                serde_yaml::to_string(&key)
                    .unwrap_or_default()
                    .trim_end()
            )));
        }
        Ok(Self { resources })
    }
}

fn section_resources(
    section: &str,
    kind: EntryKind,
    value: serde_yaml::Value,
) -> Result<Vec<Resource>, ManifestError> {
    let map = match value {
        serde_yaml::Value::Null => return Ok(Vec::new()),
        serde_yaml::Value::Mapping(map) => map,
        other => {
            return Err(ManifestError::Malformed(format!(
                "section '{section}' must be a mapping, got {}",
                kind_name(&other)
            )))
        }
    };

    let mut resources = Vec::with_capacity(map.len());
    for (name, params) in map {
        let name = match name {
            serde_yaml::Value::String(s) => s,
            other => {
                return Err(ManifestError::Malformed(format!(
                    "resource names in '{section}' must be strings, got {}",
                    kind_name(&other)
                )))
            }
        };
        let params = match yaml_to_json_value(params).map_err(ManifestError::Malformed)? {
            serde_json::Value::Null => Params::new(),
            serde_json::Value::Object(map) => map,
            other => {
                return Err(ManifestError::Malformed(format!(
                    "parameters of {section} '{name}' must be a mapping, got {other}"
                )))
            }
        };
        resources.push(Resource { kind, name, params });
    }
    Ok(resources)
}

fn kind_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

// ─── Resolution ──────────────────────────────────────────────────────

/// A resource that failed to resolve.
#[derive(Debug)]
pub struct ResourceFailure {
    pub kind: EntryKind,
    pub name: String,
    pub error: ResolveError,
}

/// Result of resolving every resource of a manifest.
#[derive(Debug, Default)]
pub struct ManifestResolution {
    /// Plans of the resources that resolved, in manifest order.
    pub plans: Vec<ArtifactPlan>,
    /// Resources that failed, including later duplicates of a path.
    pub failures: Vec<ResourceFailure>,
}

impl ManifestResolution {
    /// Whether the manifest may be applied.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolve every resource, collecting failures instead of stopping.
///
/// A plan targeting a path already claimed by an earlier resource is
/// recorded as a `DuplicatePath` failure of the later resource.
pub fn resolve_manifest<L: ConfigLookup>(
    resolver: &Resolver<L>,
    manifest: &Manifest,
) -> ManifestResolution {
    let mut outcome = ManifestResolution::default();
    let mut claimed: HashMap<PathBuf, String> = HashMap::new();

    for resource in &manifest.resources {
        let plan = match resolver.resolve(resource.kind, &resource.name, &resource.params) {
            Ok(plan) => plan,
            Err(error) => {
                outcome.failures.push(ResourceFailure {
                    kind: resource.kind,
                    name: resource.name.clone(),
                    error,
                });
                continue;
            }
        };

        let clash = plan
            .artifacts()
            .iter()
            .find(|a| claimed.contains_key(&a.path))
            .map(|a| a.path.clone());
        if let Some(path) = clash {
            tracing::debug!(
                path = %path.display(),
                first = claimed.get(&path).map(String::as_str).unwrap_or_default(),
                second = %resource.name,
                "path claimed twice"
            );
            outcome.failures.push(ResourceFailure {
                kind: resource.kind,
                name: resource.name.clone(),
                error: ResolveError::DuplicatePath {
                    identifier: resource.name.clone(),
                    path,
                },
            });
            continue;
        }

        for artifact in plan.artifacts() {
            claimed.insert(artifact.path.clone(), resource.name.clone());
        }
        outcome.plans.push(plan);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use sslmgmt_lookup::MemoryLookup;
    use sslmgmt_resolve::PkiStores;

    fn parse(yaml: &str) -> Result<Manifest, ManifestError> {
        Manifest::from_yaml(serde_yaml::from_str(yaml).unwrap())
    }

    fn resolver() -> Resolver<MemoryLookup> {
        Resolver::new(
            MemoryLookup::new()
                .with_ca("testca", "cacert\n")
                .with_cert("test_certificate", "testcert\n", "testkey\n")
                .with_cert("zeta", "z\n", "zk\n"),
            PkiStores::new(),
        )
    }

    #[test]
    fn test_order_is_cas_then_certs_in_file_order() {
        let manifest = parse(
            "certs:\n  zeta: {pkistore: default}\n  alpha: {pkistore: default}\nca:\n  testca: {pkistore: default}\n",
        )
        .unwrap();
        let names: Vec<_> = manifest
            .resources
            .iter()
            .map(|r| (r.kind, r.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                (EntryKind::Ca, "testca"),
                (EntryKind::Cert, "zeta"),
                (EntryKind::Cert, "alpha"),
            ]
        );
    }

    #[test]
    fn test_null_params_and_empty_document() {
        let manifest = parse("ca:\n  testca:\n").unwrap();
        assert!(manifest.resources[0].params.is_empty());
        assert!(parse("~").unwrap().resources.is_empty());
    }

    #[test]
    fn test_malformed_sections() {
        assert!(matches!(parse("- a\n"), Err(ManifestError::Malformed(_))));
        assert!(matches!(parse("ca: [a]\n"), Err(ManifestError::Malformed(_))));
        assert!(matches!(parse("ca:\n  x: 1\n"), Err(ManifestError::Malformed(_))));
        match parse("hosts: {}\n") {
            Err(ManifestError::Malformed(msg)) => assert!(msg.contains("hosts")),
            other => panic!("Expected Malformed, got: {other:?}"),
        }
    }

    #[test]
    fn test_failures_do_not_stop_other_resources() {
        let manifest = parse(
            "ca:\n  testca: {pkistore: default}\ncerts:\n  test_certificate: {}\n  zeta: {pkistore: default}\n",
        )
        .unwrap();
        let outcome = resolve_manifest(&resolver(), &manifest);
        assert_eq!(outcome.plans.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].name, "test_certificate");
        assert!(matches!(
            outcome.failures[0].error,
            ResolveError::MissingRequiredParameter { .. }
        ));
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_duplicate_paths_across_resources() {
        let manifest = parse(
            "certs:\n  test_certificate: {pkistore: default}\n  zeta:\n    pkistore: custom\n    customstore: {certfilename: /etc/pki/tls/certs/test_certificate.pem}\n",
        )
        .unwrap();
        let outcome = resolve_manifest(&resolver(), &manifest);
        assert_eq!(outcome.plans.len(), 1);
        match &outcome.failures[0].error {
            ResolveError::DuplicatePath { identifier, path } => {
                assert_eq!(identifier, "zeta");
                assert_eq!(path, &PathBuf::from("/etc/pki/tls/certs/test_certificate.pem"));
            }
            other => panic!("Expected DuplicatePath, got: {other}"),
        }
    }
}
