//! cg-config
//!
//! Layered YAML configuration for a compound gate deployment.
//!
//! ```text
//!   base.yaml ─┐
//!   site.yaml ─┼─ deep merge (later wins) ─► JSON ─► canonical string ─► sha256 hex
//!   ...       ─┘
//! ```
//!
//! The merged JSON is read through JSON pointers by [`CompoundConfig`].
//! [`report_unused_keys`] lists leaves nothing reads, so a typo in a key
//! does not go unnoticed.

mod compound;
mod consumption;

pub use compound::{CompoundConfig, LaneSeed};
pub use consumption::{report_unused_keys, UnusedKeyPolicy, UnusedKeyReport, CONSUMED_POINTERS};

use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    // Earlier docs are the base, later docs override.
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    let canonical_json =
        serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; anything else (arrays included) is replaced.
fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let base = concat!(
            "lanes:\n",
            "  - {number: 1, capacity_per_minute: 5}\n",
            "  - {number: 2, capacity_per_minute: 5}\n",
        );
        let site = "lanes:\n  - {number: 9, capacity_per_minute: 1}\n";
        let cfg = load_layered_yaml_from_strings(&[base, site]).unwrap();
        let lanes = cfg.config_json["lanes"].as_array().unwrap();
        assert_eq!(lanes.len(), 1);
        assert_eq!(lanes[0]["number"], 9);
    }

    #[test]
    fn hash_is_lowercase_sha256_hex() {
        let cfg = load_layered_yaml_from_strings(&["compound: {name: north}"]).unwrap();
        assert_eq!(cfg.config_hash.len(), 64);
        assert_eq!(cfg.config_hash, cfg.config_hash.to_ascii_lowercase());
        assert!(cfg.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(load_layered_yaml_from_strings(&["lanes: [unclosed"]).is_err());
    }
}
