use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_COMPOUND_NAME: &str = "compound";
pub const DEFAULT_WINDOW_MINUTES: i64 = 30;

/// A lane to create at boot, in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaneSeed {
    pub number: i64,
    pub capacity_per_minute: i64,
}

/// Typed view of the keys the gate reads. See [`crate::CONSUMED_POINTERS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompoundConfig {
    pub name: String,
    pub lanes: Vec<LaneSeed>,
    pub reservation_window_minutes: i64,
    pub audit_journal_path: Option<PathBuf>,
}

impl Default for CompoundConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COMPOUND_NAME.to_string(),
            lanes: Vec::new(),
            reservation_window_minutes: DEFAULT_WINDOW_MINUTES,
            audit_journal_path: None,
        }
    }
}

impl CompoundConfig {
    /// Build from merged config JSON (see [`crate::load_layered_yaml`]).
    ///
    /// Every key is optional:
    /// - compound.name (string); default "compound"
    /// - lanes (list of {number, capacity_per_minute}); default none
    /// - reservation.window_minutes (positive integer); default 30
    /// - audit.journal_path (string); default no journal
    ///
    /// Positivity and uniqueness of lane numbers are enforced again when the
    /// lanes are added; checking here reports the offending list index.
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let name = match cfg.pointer("/compound/name") {
            None | Some(Value::Null) => DEFAULT_COMPOUND_NAME.to_string(),
            Some(v) => v
                .as_str()
                .context("compound.name must be a string")?
                .trim()
                .to_string(),
        };
        if name.is_empty() {
            bail!("compound.name must not be empty");
        }

        let lanes = match cfg.pointer("/lanes") {
            None | Some(Value::Null) => Vec::new(),
            Some(v) => {
                let arr = v.as_array().context("lanes must be a list")?;
                arr.iter()
                    .enumerate()
                    .map(|(i, l)| lane_seed(i, l))
                    .collect::<Result<Vec<_>>>()?
            }
        };

        let reservation_window_minutes = match cfg.pointer("/reservation/window_minutes") {
            None | Some(Value::Null) => DEFAULT_WINDOW_MINUTES,
            Some(v) => v
                .as_i64()
                .context("reservation.window_minutes must be an integer")?,
        };
        if reservation_window_minutes <= 0 {
            bail!("reservation.window_minutes must be > 0 (got {reservation_window_minutes})");
        }

        let audit_journal_path = match cfg.pointer("/audit/journal_path") {
            None | Some(Value::Null) => None,
            Some(v) => Some(PathBuf::from(
                v.as_str().context("audit.journal_path must be a string")?,
            )),
        };

        Ok(Self {
            name,
            lanes,
            reservation_window_minutes,
            audit_journal_path,
        })
    }
}

fn lane_seed(i: usize, v: &Value) -> Result<LaneSeed> {
    let number = v
        .pointer("/number")
        .and_then(Value::as_i64)
        .with_context(|| format!("lanes[{i}].number missing or not an integer"))?;
    let capacity_per_minute = v
        .pointer("/capacity_per_minute")
        .and_then(Value::as_i64)
        .with_context(|| format!("lanes[{i}].capacity_per_minute missing or not an integer"))?;

    if number <= 0 || capacity_per_minute <= 0 {
        bail!("lanes[{i}]: number and capacity_per_minute must be positive");
    }
    Ok(LaneSeed {
        number,
        capacity_per_minute,
    })
}
