//! # Hierarchical YAML Store
//!
//! A hierarchy is an ordered list of data-file levels, highest priority
//! first, relative to a data directory:
//!
//! ```text
//! nodes/%{hostname}   ->  <datadir>/nodes/web01.yaml
//! role/%{role}        ->  <datadir>/role/web.yaml
//! common              ->  <datadir>/common.yaml
//! ```
//!
//! Each data file may declare the `sslmgmt::ca` and `sslmgmt::certs`
//! mappings. A lookup returns the entry from the first level whose
//! namespace mapping declares the name, so a node file can override a
//! single certificate while inheriting the rest from `common`.
//!
//! ## Loading
//!
//! All levels are read once by [`HieraLookup::load`]. Missing files and
//! levels naming an unknown fact are skipped, matching how a host without
//! node-specific data simply falls through to shared data. Unreadable or
//! malformed files fail the load: a half-read hierarchy could silently
//! select a lower-priority entry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use sslmgmt_core::{EntryKind, LookupError};

use crate::yaml::load_yaml_file;
use crate::ConfigLookup;

/// Level names and the directory they are relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    /// Base directory for relative level paths.
    pub datadir: PathBuf,
    /// Level names, highest priority first. `.yaml` is appended when absent.
    pub levels: Vec<String>,
}

impl Hierarchy {
    /// Create a hierarchy rooted at `datadir`.
    pub fn new(datadir: impl Into<PathBuf>, levels: Vec<String>) -> Self {
        Self {
            datadir: datadir.into(),
            levels,
        }
    }

    /// Interpolate facts into every level and return the data-file paths.
    ///
    /// Levels referencing a fact absent from `facts` are dropped.
    pub fn data_files(&self, facts: &BTreeMap<String, String>) -> Vec<PathBuf> {
        self.levels
            .iter()
            .filter_map(|level| match interpolate(level, facts) {
                Ok(name) => Some(self.level_path(&name)),
                Err(missing) => {
                    tracing::debug!(level = %level, fact = %missing, "skipping hierarchy level with unknown fact");
                    None
                }
            })
            .collect()
    }

    fn level_path(&self, name: &str) -> PathBuf {
        let file = if name.ends_with(".yaml") || name.ends_with(".yml") {
            name.to_string()
        } else {
            format!("{name}.yaml")
        };
        let path = Path::new(&file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.datadir.join(path)
        }
    }
}

/// Replace every `%{name}` (or `%{::name}`) with its fact value.
///
/// Returns the name of the first unknown fact on failure.
fn interpolate(template: &str, facts: &BTreeMap<String, String>) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: keep the remainder literally.
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let name = after[..end].trim().trim_start_matches("::");
        match facts.get(name) {
            Some(value) => out.push_str(value),
            None => return Err(name.to_string()),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// One loaded data file.
#[derive(Debug, Clone)]
struct Layer {
    path: PathBuf,
    ca: Map<String, Value>,
    certs: Map<String, Value>,
}

impl Layer {
    fn from_value(path: PathBuf, value: Value) -> Result<Self, LookupError> {
        let mut doc = match value {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(LookupError::Malformed {
                    path,
                    detail: format!("top level must be a mapping, found {}", type_name(&other)),
                })
            }
        };
        let ca = take_namespace(&path, &mut doc, EntryKind::Ca)?;
        let certs = take_namespace(&path, &mut doc, EntryKind::Cert)?;
        Ok(Self { path, ca, certs })
    }

    fn namespace(&self, kind: EntryKind) -> &Map<String, Value> {
        match kind {
            EntryKind::Ca => &self.ca,
            EntryKind::Cert => &self.certs,
        }
    }
}

fn take_namespace(
    path: &Path,
    doc: &mut Map<String, Value>,
    kind: EntryKind,
) -> Result<Map<String, Value>, LookupError> {
    match doc.remove(kind.namespace()) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(LookupError::Malformed {
            path: path.to_path_buf(),
            detail: format!(
                "{} must be a mapping of names to entries, found {}",
                kind.namespace(),
                type_name(&other)
            ),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// A read-only snapshot of a loaded hierarchy.
#[derive(Debug, Clone, Default)]
pub struct HieraLookup {
    layers: Vec<Layer>,
}

impl HieraLookup {
    /// Load every level of `hierarchy` after interpolating `facts`.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Read`, `Parse` or `Malformed` for the first
    /// data file that exists but cannot be used.
    pub fn load(
        hierarchy: &Hierarchy,
        facts: &BTreeMap<String, String>,
    ) -> Result<Self, LookupError> {
        let mut layers = Vec::new();
        for path in hierarchy.data_files(facts) {
            match load_yaml_file(&path)? {
                Some(value) => {
                    let layer = Layer::from_value(path, value)?;
                    tracing::debug!(
                        path = %layer.path.display(),
                        cas = layer.ca.len(),
                        certs = layer.certs.len(),
                        "loaded hierarchy level"
                    );
                    layers.push(layer);
                }
                None => {
                    tracing::debug!(path = %path.display(), "hierarchy level not present");
                }
            }
        }
        Ok(Self { layers })
    }

    /// Paths of the data files that were loaded, in priority order.
    pub fn loaded_files(&self) -> Vec<&Path> {
        self.layers.iter().map(|l| l.path.as_path()).collect()
    }

    /// The data file that declares `name`, if any.
    pub fn source_of(&self, kind: EntryKind, name: &str) -> Option<&Path> {
        self.layers
            .iter()
            .find(|l| l.namespace(kind).contains_key(name))
            .map(|l| l.path.as_path())
    }
}

impl ConfigLookup for HieraLookup {
    fn lookup(&self, kind: EntryKind, name: &str) -> Result<Option<Value>, LookupError> {
        Ok(self
            .layers
            .iter()
            .find_map(|l| l.namespace(kind).get(name))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn facts(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_interpolate_facts() {
        let f = facts(&[("hostname", "web01")]);
        assert_eq!(interpolate("nodes/%{hostname}", &f).unwrap(), "nodes/web01");
        assert_eq!(interpolate("nodes/%{::hostname}", &f).unwrap(), "nodes/web01");
        assert_eq!(interpolate("common", &f).unwrap(), "common");
        assert_eq!(interpolate("role/%{role}", &f).unwrap_err(), "role");
    }

    #[test]
    fn test_data_files_skip_unknown_facts() {
        let h = Hierarchy::new(
            "/data",
            vec!["nodes/%{hostname}".into(), "role/%{role}".into(), "common".into()],
        );
        let files = h.data_files(&facts(&[("hostname", "web01")]));
        assert_eq!(
            files,
            vec![
                PathBuf::from("/data/nodes/web01.yaml"),
                PathBuf::from("/data/common.yaml")
            ]
        );
    }

    #[test]
    fn test_higher_level_overrides_per_entry() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "nodes/web01.yaml",
            "sslmgmt::ca:\n  testca: \"node\\n\"\n",
        );
        write(
            dir.path(),
            "common.yaml",
            "sslmgmt::ca:\n  testca: \"common\\n\"\n  otherca: \"other\\n\"\nsslmgmt::certs:\n  web:\n    cert: c\n    key: k\n",
        );
        let h = Hierarchy::new(dir.path(), vec!["nodes/%{hostname}".into(), "common".into()]);
        let store = HieraLookup::load(&h, &facts(&[("hostname", "web01")])).unwrap();

        assert_eq!(
            store.lookup(EntryKind::Ca, "testca").unwrap(),
            Some(Value::String("node\n".into()))
        );
        assert_eq!(
            store.lookup(EntryKind::Ca, "otherca").unwrap(),
            Some(Value::String("other\n".into()))
        );
        assert_eq!(
            store.lookup(EntryKind::Cert, "web").unwrap().unwrap()["key"],
            "k"
        );
        assert!(store.lookup(EntryKind::Cert, "missing").unwrap().is_none());
        assert_eq!(
            store.source_of(EntryKind::Ca, "otherca").unwrap(),
            dir.path().join("common.yaml")
        );
    }

    #[test]
    fn test_missing_levels_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "common.yaml", "sslmgmt::ca:\n  a: x\n");
        let h = Hierarchy::new(dir.path(), vec!["nodes/nothere".into(), "common".into()]);
        let store = HieraLookup::load(&h, &BTreeMap::new()).unwrap();
        assert_eq!(store.loaded_files().len(), 1);
    }

    #[test]
    fn test_namespace_must_be_mapping() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "common.yaml", "sslmgmt::certs: [a, b]\n");
        let h = Hierarchy::new(dir.path(), vec!["common".into()]);
        let err = HieraLookup::load(&h, &BTreeMap::new()).unwrap_err();
        match err {
            LookupError::Malformed { detail, .. } => assert!(detail.contains("sslmgmt::certs")),
            other => panic!("expected Malformed, got: {other}"),
        }
    }

    #[test]
    fn test_empty_file_is_empty_layer() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "common.yaml", "");
        let h = Hierarchy::new(dir.path(), vec!["common".into()]);
        let store = HieraLookup::load(&h, &BTreeMap::new()).unwrap();
        assert!(store.lookup(EntryKind::Ca, "x").unwrap().is_none());
    }
}
