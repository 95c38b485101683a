//! Wire log: a per-run JSONL record of every line crossing the wrapper,
//! plus lifecycle events.
//!
//! Purely an observability sink. Write failures are swallowed so the
//! protocol path never blocks on disk problems.

use crate::error::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireDirection {
    FromGui,
    ToGui,
    ToEngine,
    FromEngine,
    Lifecycle,
}

#[derive(Debug, Serialize)]
struct WireEntry<'a> {
    seq: u64,
    ts: String,
    /// Engine session counter; increments on every reconfiguration restart.
    run: u64,
    dir: WireDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    text: &'a str,
}

pub struct WireLog {
    file: Mutex<Option<File>>,
    seq: AtomicU64,
    run: AtomicU64,
}

impl WireLog {
    /// Opens the log at `path`, truncating any previous run's contents.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            file: Mutex::new(Some(file)),
            seq: AtomicU64::new(0),
            run: AtomicU64::new(0),
        })
    }

    /// A log that records nothing. Used when no wire-log path is set.
    pub fn disabled() -> Self {
        Self {
            file: Mutex::new(None),
            seq: AtomicU64::new(0),
            run: AtomicU64::new(0),
        }
    }

    /// Advances the session counter. Called when a reconfigured engine
    /// session starts.
    pub fn next_run(&self) {
        self.run.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record(&self, dir: WireDirection, text: &str) {
        self.record_from(dir, None, text);
    }

    /// Records one line with an optional stream tag (for engine output,
    /// which arrives on either stdout or stderr).
    pub fn record_from(&self, dir: WireDirection, source: Option<&str>, text: &str) {
        let entry = WireEntry {
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
            ts: Utc::now().to_rfc3339(),
            run: self.run.load(Ordering::SeqCst),
            dir,
            source,
            text,
        };

        let Ok(mut guard) = self.file.lock() else {
            return;
        };
        let Some(file) = guard.as_mut() else {
            return;
        };
        let Ok(json) = serde_json::to_string(&entry) else {
            return;
        };
        if let Err(e) = writeln!(file, "{json}") {
            warn!(error = %e, "wire log write failed, entry dropped");
        }
    }
}
