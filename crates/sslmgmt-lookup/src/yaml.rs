//! # YAML Loading
//!
//! Data files are written in YAML but resolved as `serde_json::Value`, so
//! the resolver works on one value model regardless of where a parameter
//! or entry came from. Conversion drops YAML tags and stringifies scalar
//! mapping keys.

use std::path::Path;

use serde_json::Value;
use sslmgmt_core::LookupError;

/// Load a YAML data file as a JSON value.
///
/// Returns `Ok(None)` when the file does not exist, so callers can treat
/// missing hierarchy levels as empty. An empty file loads as `Value::Null`.
pub fn load_yaml_file(path: &Path) -> Result<Option<Value>, LookupError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(LookupError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| LookupError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
    yaml_to_json_value(yaml)
        .map(Some)
        .map_err(|detail| LookupError::Malformed {
            path: path.to_path_buf(),
            detail,
        })
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
pub fn yaml_to_json_value(yaml: serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s)),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> =
                seq.into_iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                obj.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(obj))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(tagged.value),
    }
}
