//! Scenario: unused config keys are reported.
//!
//! GREEN when:
//! - a config using only read keys yields a clean report under `Fail`
//! - an unread key is listed by its JSON pointer under `Warn`
//! - the same config errors under `Fail`

use cg_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

const CLEAN_YAML: &str = r#"
compound:
  name: "north"
lanes:
  - number: 1
    capacity_per_minute: 6
reservation:
  window_minutes: 30
audit:
  journal_path: "passes.jsonl"
"#;

const TYPO_YAML: &str = r#"
reservation:
  window_minuets: 45
gate:
  camera: true
"#;

#[test]
fn clean_config_passes_fail_policy() {
    let cfg = load_layered_yaml_from_strings(&[CLEAN_YAML]).unwrap();
    let report = report_unused_keys(&cfg.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
    assert!(report.consumed_prefixes.contains(&"/lanes".to_string()));
}

#[test]
fn unread_keys_are_warned_by_pointer() {
    let cfg = load_layered_yaml_from_strings(&[CLEAN_YAML, TYPO_YAML]).unwrap();
    let report = report_unused_keys(&cfg.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/gate/camera".to_string(),
            "/reservation/window_minuets".to_string()
        ]
    );
}

#[test]
fn unread_keys_fail_under_fail_policy() {
    let cfg = load_layered_yaml_from_strings(&[CLEAN_YAML, TYPO_YAML]).unwrap();
    let err = report_unused_keys(&cfg.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    assert!(err.to_string().contains("CONFIG_UNUSED_KEYS"), "{err}");
}
