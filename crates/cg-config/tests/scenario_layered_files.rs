//! Scenario: layered YAML files load into a typed compound config.
//!
//! GREEN when:
//! - files merge in the order given
//! - `CompoundConfig::from_config_json` sees the merged values
//! - a missing file is an error naming the path

use std::fs;

use cg_config::{load_layered_yaml, CompoundConfig, LaneSeed};

#[test]
fn scenario_files_merge_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let site = dir.path().join("site.yaml");
    fs::write(
        &base,
        "compound: {name: north}\nlanes:\n  - {number: 1, capacity_per_minute: 3}\n",
    )
    .unwrap();
    fs::write(&site, "reservation: {window_minutes: 45}\n").unwrap();

    let loaded = load_layered_yaml(&[base.to_str().unwrap(), site.to_str().unwrap()]).unwrap();
    let cfg = CompoundConfig::from_config_json(&loaded.config_json).unwrap();

    assert_eq!(cfg.name, "north");
    assert_eq!(
        cfg.lanes,
        vec![LaneSeed {
            number: 1,
            capacity_per_minute: 3
        }]
    );
    assert_eq!(cfg.reservation_window_minutes, 45);
    assert!(cfg.audit_journal_path.is_none());
}

#[test]
fn scenario_missing_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    let err = load_layered_yaml(&[missing.to_str().unwrap()]).unwrap_err();
    assert!(format!("{err:#}").contains("nope.yaml"), "{err:#}");
}
