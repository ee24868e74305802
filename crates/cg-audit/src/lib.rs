//! cg-audit
//!
//! Append-only, hash-chained JSON Lines journal of gate activity.
//!
//! # Line format
//!
//! One canonical (recursively key-sorted, compact) JSON object per line:
//!
//! ```text
//! {"event_id":…,"event_type":"PASS_APPROVED","hash_prev":"ab…","hash_self":"cd…",
//!  "payload":{…},"seq":7,"topic":"pass","ts_utc":"…"}
//! ```
//!
//! - `hash_self` = sha256 hex of the canonical line with `hash_self` null.
//! - `hash_prev` = previous line's `hash_self` (null on the first line).
//! - `event_id` = UUID v5 over (previous hash, seq, canonical payload). No RNG,
//!   so replaying the same history yields the same ids.
//!
//! Reopening an existing journal verifies it and continues the chain.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub event_id: Uuid,
    pub seq: u64,
    pub ts_utc: DateTime<Utc>,
    pub topic: String,
    pub event_type: String,
    pub payload: Value,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Single writer over one journal file. Not synchronized; owners wrap it in
/// a mutex.
#[derive(Debug)]
pub struct AuditJournal {
    path: PathBuf,
    last_hash: Option<String>,
    seq: u64,
}

impl AuditJournal {
    /// Open (or create) the journal at `path`.
    ///
    /// An existing file must verify; a broken chain is an error rather than a
    /// silent fork.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create_dir_all {parent:?}"))?;
            }
        }

        let mut journal = Self {
            path,
            last_hash: None,
            seq: 0,
        };

        if journal.path.exists() {
            let content = fs::read_to_string(&journal.path)
                .with_context(|| format!("read journal {:?}", journal.path))?;
            match verify_chain_str(&content)? {
                VerifyResult::Valid { lines } => {
                    journal.seq = lines as u64;
                    journal.last_hash = last_entry(&content)?.and_then(|e| e.hash_self);
                }
                VerifyResult::Broken { line, reason } => {
                    bail!(
                        "JOURNAL_CHAIN_BROKEN {:?} line {line}: {reason}",
                        journal.path
                    );
                }
            }
        }

        Ok(journal)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries written so far, including ones found at open.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }

    pub fn append(
        &mut self,
        topic: &str,
        event_type: &str,
        payload: Value,
    ) -> Result<JournalEntry> {
        self.append_at(Utc::now(), topic, event_type, payload)
    }

    /// Append with an explicit timestamp.
    pub fn append_at(
        &mut self,
        ts_utc: DateTime<Utc>,
        topic: &str,
        event_type: &str,
        payload: Value,
    ) -> Result<JournalEntry> {
        let event_id = derive_event_id(self.last_hash.as_deref(), self.seq, &payload)?;

        let mut entry = JournalEntry {
            event_id,
            seq: self.seq,
            ts_utc,
            topic: topic.to_string(),
            event_type: event_type.to_string(),
            payload,
            hash_prev: self.last_hash.clone(),
            hash_self: None,
        };
        let hash = compute_entry_hash(&entry)?;
        entry.hash_self = Some(hash.clone());

        let line = canonical_json_line(&entry)?;
        append_line(&self.path, &line)?;

        // Advance only once the line is on disk.
        self.last_hash = Some(hash);
        self.seq += 1;
        Ok(entry)
    }
}

fn derive_event_id(prev_hash: Option<&str>, seq: u64, payload: &Value) -> Result<Uuid> {
    let canonical = serde_json::to_string(&sort_keys(payload)).context("serialize payload")?;
    let name = format!("{}|{seq}|{canonical}", prev_hash.unwrap_or("GENESIS"));
    Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
}

fn last_entry(content: &str) -> Result<Option<JournalEntry>> {
    match content.lines().rev().find(|l| !l.trim().is_empty()) {
        None => Ok(None),
        Some(line) => Ok(Some(
            serde_json::from_str(line.trim()).context("parse last journal entry")?,
        )),
    }
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open journal {path:?}"))?;
    f.write_all(line.as_bytes())
        .context("write journal line failed")?;
    f.write_all(b"\n").context("write newline failed")?;
    Ok(())
}

fn canonical_json_line<T: Serialize>(v: &T) -> Result<String> {
    let raw = serde_json::to_value(v).context("serialize journal entry failed")?;
    serde_json::to_string(&sort_keys(&raw)).context("json stringify failed")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for k in keys {
                let child = sort_keys(&map[&k]);
                out.insert(k, child);
            }
            Value::Object(out)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

/// Hash of the canonical line with `hash_self` cleared.
pub fn compute_entry_hash(entry: &JournalEntry) -> Result<String> {
    let mut clone = entry.clone();
    clone.hash_self = None;

    let canonical = canonical_json_line(&clone)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    /// 1-based line number of the first bad entry.
    Broken { line: usize, reason: String },
}

pub fn verify_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read journal {:?}", path.as_ref()))?;
    verify_chain_str(&content)
}

/// Walk JSONL content and check every link. Blank lines are skipped; an
/// unparseable line is an error.
pub fn verify_chain_str(content: &str) -> Result<VerifyResult> {
    let mut prev_hash: Option<String> = None;
    let mut count = 0usize;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let entry: JournalEntry = serde_json::from_str(trimmed)
            .with_context(|| format!("parse journal entry at line {}", i + 1))?;

        if entry.seq != count as u64 {
            return Ok(VerifyResult::Broken {
                line: i + 1,
                reason: format!("seq mismatch: expected {count}, got {}", entry.seq),
            });
        }

        if entry.hash_prev != prev_hash {
            return Ok(VerifyResult::Broken {
                line: i + 1,
                reason: format!(
                    "hash_prev mismatch: expected {:?}, got {:?}",
                    prev_hash, entry.hash_prev
                ),
            });
        }

        let recomputed = compute_entry_hash(&entry)?;
        if entry.hash_self.as_deref() != Some(recomputed.as_str()) {
            return Ok(VerifyResult::Broken {
                line: i + 1,
                reason: format!(
                    "hash_self mismatch: claimed {:?}, recomputed {recomputed}",
                    entry.hash_self
                ),
            });
        }

        prev_hash = entry.hash_self;
        count += 1;
    }

    Ok(VerifyResult::Valid { lines: count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_ids_are_deterministic() {
        let payload = json!({"a": 2, "b": 1});
        let a = derive_event_id(None, 0, &json!({"b": 1, "a": 2})).unwrap();
        let b = derive_event_id(None, 0, &payload).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, derive_event_id(None, 1, &payload).unwrap());
        assert_ne!(a, derive_event_id(Some("ff"), 0, &payload).unwrap());
    }

    #[test]
    fn empty_content_is_a_valid_empty_chain() {
        let empty = VerifyResult::Valid { lines: 0 };
        assert_eq!(verify_chain_str("").unwrap(), empty);
        assert_eq!(verify_chain_str("\n\n").unwrap(), empty);
    }

    #[test]
    fn garbage_line_is_an_error_not_a_break() {
        assert!(verify_chain_str("{not json").is_err());
    }
}
