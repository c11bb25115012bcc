//! Append-only operation log.
//!
//! Every attempted filesystem action is recorded as one JSON line in a
//! durable, append-only store. Records are immutable once written; normal
//! operation never edits or deletes them. The read path tolerates corrupt
//! or truncated tails by skipping unparseable lines, and a failed append is
//! reported on stderr but never aborts the organizing run (logging is
//! best-effort relative to the primary filesystem mutation).
//!
//! The store has exactly one logical writer per invocation. There is no
//! cross-process locking: two simultaneous invocations against the same
//! store can interleave writes, which is a documented precondition, not a
//! supported mode.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Kind of logged operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Move,
    Group,
    Undo,
    RunStart,
    RunEnd,
    UndoStart,
    UndoEnd,
}

/// Outcome status of a logged operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Skipped,
    Error,
    Preview,
}

/// One entry in the operation log.
///
/// Field names serialize in camelCase, matching the JSONL format of logs
/// written before this tool existed, so `read_all` can consume those too
/// (including records that predate run identifiers).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// RFC 3339 timestamp, stamped by `append`.
    #[serde(default)]
    pub timestamp: String,
    /// Opaque per-invocation identifier; absent in legacy records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub action: Action,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub dry_run: bool,
    /// For undo lifecycle markers: the run being undone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_run_id: Option<String>,
}

impl LogRecord {
    /// Builds a per-file operation record.
    pub fn operation(
        run_id: &str,
        action: Action,
        status: Status,
        source: &Path,
        destination: Option<&Path>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: String::new(),
            run_id: Some(run_id.to_string()),
            action,
            status,
            source: Some(source.to_string_lossy().to_string()),
            destination: destination.map(|p| p.to_string_lossy().to_string()),
            message: message.into(),
            dry_run: false,
            target_run_id: None,
        }
    }

    /// Builds a run lifecycle marker (`run-start`, `run-end`, `undo-start`,
    /// `undo-end`).
    pub fn marker(
        run_id: &str,
        action: Action,
        source: Option<&Path>,
        dry_run: bool,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: String::new(),
            run_id: Some(run_id.to_string()),
            action,
            status: Status::Success,
            source: source.map(|p| p.to_string_lossy().to_string()),
            destination: None,
            message: message.into(),
            dry_run,
            target_run_id: None,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_target_run_id(mut self, target_run_id: &str) -> Self {
        self.target_run_id = Some(target_run_id.to_string());
        self
    }
}

/// Handle to the append-only log store.
#[derive(Debug, Clone)]
pub struct OpLog {
    path: PathBuf,
}

impl OpLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record, stamping its timestamp.
    ///
    /// The line is written with a single write call so an interrupted
    /// process never leaves a partial record. Failures are reported on
    /// stderr and swallowed.
    pub fn append(&self, mut record: LogRecord) {
        record.timestamp = Utc::now().to_rfc3339();

        let line = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Warning: could not serialize log entry: {e}");
                return;
            }
        };

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(format!("{line}\n").as_bytes()));

        if let Err(e) = result {
            eprintln!(
                "Warning: could not write log entry to {}: {e}",
                self.path.display()
            );
        }
    }

    /// Reads every parseable record, oldest first.
    ///
    /// Malformed lines are treated as absent; a missing store is an empty
    /// log.
    pub fn read_all(&self) -> Vec<LogRecord> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(_) => return Vec::new(),
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect()
    }

    /// Returns the most recent `limit` records, newest first.
    pub fn read_recent(&self, limit: usize) -> Vec<LogRecord> {
        let records = self.read_all();
        let start = records.len().saturating_sub(limit);
        records[start..].iter().rev().cloned().collect()
    }
}
