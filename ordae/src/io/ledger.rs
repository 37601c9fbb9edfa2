//! Memory ledger: bounded, oldest-first history of completed iterations.
//!
//! Stored as a JSON array at `<memory_dir>/ledger.json`. The file is replaced
//! atomically on every append; concurrent writers from other processes can
//! still race on the read-truncate-rewrite.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::snapshot::Snapshot;
use crate::core::types::{ActionResult, Decision, Evaluation};
use crate::io::config::write_atomic;

/// Entries kept after every write.
pub const LEDGER_CAPACITY: usize = 50;

/// One completed iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub timestamp: DateTime<Utc>,
    pub iteration: u32,
    pub snapshot: Snapshot,
    pub decision: Decision,
    pub actions: ActionResult,
    pub evaluation: Evaluation,
}

/// Handle to the ledger file.
///
/// The only mutation is [`Ledger::append`]; readers get owned copies.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    capacity: usize,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(path, LEDGER_CAPACITY)
    }

    pub fn with_capacity(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity: capacity.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty ledger if none exists yet.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        debug!(path = %self.path.display(), "initializing empty ledger");
        write_entries(&self.path, &[])
    }

    /// Current entries, oldest first. A missing or corrupt ledger reads as empty.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        read_entries(&self.path)
    }

    /// Most recent entry, if any.
    pub fn last(&self) -> Option<LedgerEntry> {
        self.entries().pop()
    }

    /// Append one entry and keep only the most recent `capacity` entries.
    pub fn append(&self, entry: LedgerEntry) -> Result<()> {
        let mut entries = read_entries(&self.path);
        entries.push(entry);
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }
        debug!(
            path = %self.path.display(),
            entries = entries.len(),
            "writing ledger"
        );
        write_entries(&self.path, &entries)
    }
}

fn read_entries(path: &Path) -> Vec<LedgerEntry> {
    if !path.exists() {
        return Vec::new();
    }
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ledger unreadable; starting fresh");
            return Vec::new();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ledger corrupt; starting fresh");
            Vec::new()
        }
    }
}

fn write_entries(path: &Path, entries: &[LedgerEntry]) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(entries).context("serialize ledger")?;
    buf.push('\n');
    write_atomic(path, &buf).with_context(|| format!("write ledger {}", path.display()))
}
