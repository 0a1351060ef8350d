//! `--param key=value` parsing.
//!
//! Values are YAML, so `installkey=false` is a boolean, `chain=testca` a
//! string and `customstore={certfilename: /x.pem}` a mapping.

use anyhow::{anyhow, Context, Result};
use sslmgmt_lookup::yaml_to_json_value;
use sslmgmt_resolve::Params;

/// Parse one `key=value` pair.
pub fn parse_param(raw: &str) -> Result<(String, serde_json::Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid parameter '{raw}': expected key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("invalid parameter '{raw}': empty key"));
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(value)
        .with_context(|| format!("invalid value for parameter '{key}'"))?;
    let json = yaml_to_json_value(yaml)
        .map_err(|e| anyhow!("invalid value for parameter '{key}': {e}"))?;
    Ok((key.to_string(), json))
}

/// Parse every `--param` flag into a parameter set; later flags win.
pub fn parse_params(raw: &[String]) -> Result<Params> {
    let mut params = Params::new();
    for item in raw {
        let (key, value) = parse_param(item)?;
        params.insert(key, value);
    }
    Ok(params)
}
