//! # Configuration
//!
//! The `sslmgmt.yaml` file: where the data hierarchy lives, which facts
//! interpolate into it, and which named presets requests may select.
//!
//! ```yaml
//! datadir: /etc/sslmgmt/data
//! hierarchy:
//!   - "nodes/%{hostname}"
//!   - "common"
//! facts:
//!   role: web
//! pkistores:
//!   web:
//!     certdir: /etc/nginx/ssl
//!     group: nginx
//!     keymode: "0640"
//! ```
//!
//! Every key is optional. Preset fields that are not given take the value
//! of the built-in `default` preset.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sslmgmt_core::{FileMode, ParseModeError};
use sslmgmt_lookup::Hierarchy;
use sslmgmt_resolve::{PkiStore, PkiStores, StoreConfigError};

/// Path read when neither `--config` nor `SSLMGMT_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sslmgmt/sslmgmt.yaml";

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SSLMGMT_CONFIG";

/// Hierarchy used when the configuration names none.
const DEFAULT_LEVEL: &str = "common";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file {0} does not exist")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("pkistore name '{0}' is reserved")]
    ReservedStoreName(String),
    #[error("pkistore '{store}': invalid {field}: {source}")]
    InvalidMode {
        store: String,
        field: &'static str,
        source: ParseModeError,
    },
    #[error("invalid fact '{0}': expected key=value")]
    InvalidFact(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    datadir: Option<PathBuf>,
    hierarchy: Option<Vec<String>>,
    #[serde(default)]
    facts: BTreeMap<String, String>,
    #[serde(default)]
    pkistores: BTreeMap<String, RawStore>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStore {
    certdir: Option<PathBuf>,
    keydir: Option<PathBuf>,
    owner: Option<String>,
    group: Option<String>,
    certmode: Option<String>,
    keymode: Option<String>,
}

/// Loaded configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// File the settings came from; `None` for built-in defaults.
    pub source: Option<PathBuf>,
    pub hierarchy: Hierarchy,
    /// Facts from the configuration file. Host and command-line facts are
    /// layered on top by [`Settings::facts`].
    pub config_facts: BTreeMap<String, String>,
    pub stores: PkiStores,
}

impl Settings {
    /// Load the configuration.
    ///
    /// `explicit` is the path from `--config` or `SSLMGMT_CONFIG`; it must
    /// exist. Without it, [`DEFAULT_CONFIG_PATH`] is read if present and
    /// built-in defaults are used otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if required {
                    return Err(ConfigError::NotFound(path));
                }
                tracing::debug!(path = %path.display(), "no configuration file; using defaults");
                return Self::from_raw(RawConfig::default(), config_dir(&path), None);
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        tracing::debug!(path = %path.display(), "loading configuration");
        let mut settings = Self::from_yaml_str(&content, config_dir(&path)).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.clone(),
                source,
            },
            other => other,
        })?;
        settings.source = Some(path);
        Ok(settings)
    }

    /// Parse configuration text; relative paths resolve against `base_dir`.
    pub fn from_yaml_str(content: &str, base_dir: PathBuf) -> Result<Self, ConfigError> {
        let raw = if content.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            })?
        };
        Self::from_raw(raw, base_dir, None)
    }

    fn from_raw(
        raw: RawConfig,
        base_dir: PathBuf,
        source: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let datadir = match raw.datadir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => base_dir.join(dir),
            None => base_dir,
        };
        let levels = raw
            .hierarchy
            .unwrap_or_else(|| vec![DEFAULT_LEVEL.to_string()]);

        let mut stores = PkiStores::new();
        for (name, store) in raw.pkistores {
            let preset = build_store(&name, store, stores.default_store())?;
            stores.insert(&name, preset).map_err(|e| match e {
                StoreConfigError::ReservedName(name) => ConfigError::ReservedStoreName(name),
            })?;
        }

        Ok(Self {
            source,
            hierarchy: Hierarchy::new(datadir, levels),
            config_facts: raw.facts,
            stores,
        })
    }

    /// Facts for hierarchy interpolation: the host name, then configured
    /// facts, then `overrides` (`key=value`), later sources winning.
    pub fn facts(&self, overrides: &[String]) -> Result<BTreeMap<String, String>, ConfigError> {
        let mut facts = BTreeMap::new();
        match nix::unistd::gethostname() {
            Ok(name) => match name.into_string() {
                Ok(name) => {
                    facts.insert("hostname".to_string(), name);
                }
                Err(_) => tracing::warn!("host name is not valid UTF-8; fact not set"),
            },
            Err(e) => tracing::warn!("failed to read host name: {e}"),
        }
        facts.extend(self.config_facts.clone());
        for raw in overrides {
            let (key, value) = parse_fact(raw)?;
            facts.insert(key, value);
        }
        Ok(facts)
    }
}

fn config_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn build_store(name: &str, raw: RawStore, base: &PkiStore) -> Result<PkiStore, ConfigError> {
    let mode = |field: &'static str, value: Option<String>, fallback: FileMode| match value {
        None => Ok(fallback),
        Some(s) => s.parse::<FileMode>().map_err(|source| ConfigError::InvalidMode {
            store: name.to_string(),
            field,
            source,
        }),
    };
    Ok(PkiStore {
        certdir: raw.certdir.unwrap_or_else(|| base.certdir.clone()),
        keydir: raw.keydir.unwrap_or_else(|| base.keydir.clone()),
        owner: raw.owner.unwrap_or_else(|| base.owner.clone()),
        group: raw.group.unwrap_or_else(|| base.group.clone()),
        certmode: mode("certmode", raw.certmode, base.certmode)?,
        keymode: mode("keymode", raw.keymode, base.keymode)?,
    })
}

/// Split a `key=value` fact.
pub fn parse_fact(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidFact(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings = Settings::from_yaml_str("", PathBuf::from("/etc/sslmgmt")).unwrap();
        assert_eq!(settings.hierarchy.datadir, PathBuf::from("/etc/sslmgmt"));
        assert_eq!(settings.hierarchy.levels, vec!["common".to_string()]);
        assert_eq!(settings.stores.names(), vec!["default"]);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
datadir: data
hierarchy:
  - "nodes/%{hostname}"
  - common
facts:
  role: web
pkistores:
  web:
    certdir: /etc/nginx/ssl
    group: nginx
    keymode: "0640"
"#;
        let settings = Settings::from_yaml_str(yaml, PathBuf::from("/etc/sslmgmt")).unwrap();
        assert_eq!(settings.hierarchy.datadir, PathBuf::from("/etc/sslmgmt/data"));
        assert_eq!(settings.hierarchy.levels.len(), 2);
        assert_eq!(settings.config_facts.get("role").map(String::as_str), Some("web"));

        let web = settings.stores.get("web").unwrap();
        assert_eq!(web.certdir, PathBuf::from("/etc/nginx/ssl"));
        assert_eq!(web.keydir, PathBuf::from("/etc/pki/tls/private"));
        assert_eq!(web.owner, "root");
        assert_eq!(web.group, "nginx");
        assert_eq!(web.certmode, FileMode::CERT);
        assert_eq!(web.keymode.to_string(), "0640");
    }

    #[test]
    fn test_reserved_store_names() {
        for name in ["default", "custom"] {
            let yaml = format!("pkistores:\n  {name}:\n    owner: www\n");
            match Settings::from_yaml_str(&yaml, PathBuf::from("/")) {
                Err(ConfigError::ReservedStoreName(n)) => assert_eq!(n, name),
                other => panic!("Expected ReservedStoreName, got: {other:?}"),
            }
        }
    }

    #[test]
    fn test_invalid_mode() {
        let yaml = "pkistores:\n  web:\n    keymode: \"rw-r-----\"\n";
        match Settings::from_yaml_str(yaml, PathBuf::from("/")) {
            Err(ConfigError::InvalidMode { store, field, .. }) => {
                assert_eq!(store, "web");
                assert_eq!(field, "keymode");
            }
            other => panic!("Expected InvalidMode, got: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = Settings::from_yaml_str("datadirs: /x\n", PathBuf::from("/"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_from_file_sets_source_and_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sslmgmt.yaml");
        std::fs::write(&path, "hierarchy: [site]\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.source.as_deref(), Some(path.as_path()));
        assert_eq!(settings.hierarchy.datadir, dir.path());
    }

    #[test]
    fn test_fact_layering() {
        let yaml = "facts:\n  role: web\n  hostname: configured\n";
        let settings = Settings::from_yaml_str(yaml, PathBuf::from("/")).unwrap();
        let facts = settings.facts(&["role=db".to_string()]).unwrap();
        assert_eq!(facts.get("role").map(String::as_str), Some("db"));
        assert_eq!(facts.get("hostname").map(String::as_str), Some("configured"));
    }

    #[test]
    fn test_parse_fact() {
        assert_eq!(
            parse_fact("env=prod=1").unwrap(),
            ("env".to_string(), "prod=1".to_string())
        );
        assert!(parse_fact("noequals").is_err());
        assert!(parse_fact("=value").is_err());
    }
}
