//! Undo engine: reverses a recorded run by replaying its moves backwards.
//!
//! Undo is itself a run: it gets its own identifier, writes `undo-start` and
//! `undo-end` markers naming the target run, and records every reverse move
//! through the same collision-safe mover. Undoing an undo is therefore just
//! another undo targeting that run.
//!
//! Logs written before run identifiers existed are still reversible: when no
//! identified run is found, the engine infers a batch from record
//! timestamps, treating consecutive legacy operations no more than two
//! minutes apart as one invocation.

use crate::mover::{MoveOutcome, Mover};
use crate::oplog::{Action, LogRecord, OpLog, Status};
use crate::organizer::generate_run_id;
use chrono::{DateTime, Duration, FixedOffset};
use std::path::PathBuf;

/// Label recorded as the target of an undo over an inferred legacy batch.
const LEGACY_BATCH: &str = "legacy-batch";

/// Consecutive legacy records further apart than this belong to different
/// invocations.
const LEGACY_GAP_MINUTES: i64 = 2;

/// Options for one undo invocation.
#[derive(Debug, Clone, Default)]
pub struct UndoOptions {
    /// Undo this specific run instead of the most recent one.
    pub run_id: Option<String>,
    pub dry_run: bool,
}

/// Aggregate result of one undo invocation.
#[derive(Debug)]
pub struct UndoSummary {
    /// The run that was undone, or `"legacy-batch"` for an inferred batch;
    /// `None` when nothing was found to undo.
    pub target_run_id: Option<String>,
    /// Identifier of the undo run itself, when one was started.
    pub undo_run_id: Option<String>,
    pub undone_count: usize,
    pub error_count: usize,
    pub dry_run: bool,
    pub message: String,
    pub preview: Vec<MoveOutcome>,
}

impl UndoSummary {
    fn nothing_to_undo(message: &str, dry_run: bool) -> Self {
        Self {
            target_run_id: None,
            undo_run_id: None,
            undone_count: 0,
            error_count: 0,
            dry_run,
            message: message.to_string(),
            preview: Vec::new(),
        }
    }
}

/// A reversible recorded operation: where the file came from and where it
/// ended up.
#[derive(Debug, Clone)]
struct RecordedMove {
    source: PathBuf,
    destination: PathBuf,
}

impl RecordedMove {
    fn from_record(record: &LogRecord) -> Option<Self> {
        if !matches!(record.action, Action::Move | Action::Group) {
            return None;
        }
        if record.status != Status::Success {
            return None;
        }
        let source = record.source.as_deref()?;
        let destination = record.destination.as_deref()?;
        Some(Self {
            source: PathBuf::from(source),
            destination: PathBuf::from(destination),
        })
    }
}

/// Reverses recorded runs against an operation log.
pub struct UndoEngine<'a> {
    log: &'a OpLog,
}

impl<'a> UndoEngine<'a> {
    pub fn new(log: &'a OpLog) -> Self {
        Self { log }
    }

    /// Undoes the targeted run, or the most recent real run, or an inferred
    /// legacy batch, in that order of preference.
    ///
    /// A zero-effect invocation (nothing found to undo) writes no markers
    /// and leaves the log untouched.
    pub fn undo_last_run(&self, options: &UndoOptions) -> UndoSummary {
        let records = self.log.read_all();

        let target = options
            .run_id
            .clone()
            .or_else(|| find_latest_real_run_id(&records));

        let (target_label, moves) = match target {
            Some(run_id) => {
                let moves = select_run_moves(&records, &run_id);
                if moves.is_empty() {
                    return UndoSummary::nothing_to_undo(
                        "No successful move/group operations to undo.",
                        options.dry_run,
                    );
                }
                (run_id, moves)
            }
            None => {
                let moves = find_latest_legacy_batch(&records);
                if moves.is_empty() {
                    return UndoSummary::nothing_to_undo(
                        "No previous run found to undo.",
                        options.dry_run,
                    );
                }
                (LEGACY_BATCH.to_string(), moves)
            }
        };

        let dry_run = options.dry_run;
        let undo_run_id = generate_run_id();

        self.log.append(
            LogRecord::marker(
                &undo_run_id,
                Action::UndoStart,
                None,
                dry_run,
                format!("Undo of {target_label} started."),
            )
            .with_target_run_id(&target_label),
        );

        let mover = Mover::new(self.log);
        let mut preview = Vec::new();
        let mut undone_count = 0;
        let mut error_count = 0;

        // Reverse order: the last move of the run is the first undone.
        for recorded in moves.iter().rev() {
            if !dry_run && !recorded.destination.exists() {
                let message = format!(
                    "{} no longer exists; skipped.",
                    recorded.destination.display()
                );
                self.log.append(
                    LogRecord::operation(
                        &undo_run_id,
                        Action::Undo,
                        Status::Skipped,
                        &recorded.destination,
                        Some(&recorded.source),
                        message.clone(),
                    )
                    .with_dry_run(dry_run),
                );
                preview.push(MoveOutcome {
                    action: Action::Undo,
                    status: Status::Skipped,
                    source: recorded.destination.clone(),
                    destination: Some(recorded.source.clone()),
                    message,
                });
                error_count += 1;
                continue;
            }

            let outcome = mover.apply_undo(
                &recorded.destination,
                &recorded.source,
                &undo_run_id,
                dry_run,
            );
            match outcome.status {
                Status::Success | Status::Preview => undone_count += 1,
                Status::Error => error_count += 1,
                Status::Skipped => {}
            }
            preview.push(outcome);
        }

        let message = if dry_run {
            format!("{undone_count} operation(s) would be undone.")
        } else {
            format!("{undone_count} operation(s) undone.")
        };

        self.log.append(
            LogRecord::marker(
                &undo_run_id,
                Action::UndoEnd,
                None,
                dry_run,
                message.clone(),
            )
            .with_target_run_id(&target_label),
        );

        UndoSummary {
            target_run_id: Some(target_label),
            undo_run_id: Some(undo_run_id),
            undone_count,
            error_count,
            dry_run,
            message,
            preview,
        }
    }
}

/// Most recent completed real run: scans backwards for a `run-end` marker
/// that carries a run identifier and was not a dry-run.
fn find_latest_real_run_id(records: &[LogRecord]) -> Option<String> {
    records
        .iter()
        .rev()
        .find(|r| r.action == Action::RunEnd && r.run_id.is_some() && !r.dry_run)
        .and_then(|r| r.run_id.clone())
}

/// Reversible operations of one run, in their original log order.
fn select_run_moves(records: &[LogRecord], run_id: &str) -> Vec<RecordedMove> {
    records
        .iter()
        .filter(|r| r.run_id.as_deref() == Some(run_id) && !r.dry_run)
        .filter_map(RecordedMove::from_record)
        .collect()
}

/// A legacy record eligible for batch inference: reversible, not a
/// dry-run, and written before run identifiers existed.
fn legacy_candidate(record: &LogRecord) -> Option<RecordedMove> {
    if record.run_id.is_some() || record.dry_run {
        return None;
    }
    RecordedMove::from_record(record)
}

/// Infers the most recent batch among legacy records without run
/// identifiers.
///
/// Walks backwards from the newest reversible legacy record while records
/// stay contiguous candidates and each consecutive pair of timestamps
/// differs by at most two minutes. The first record that breaks either
/// condition ends the batch; an unparseable timestamp does too.
fn find_latest_legacy_batch(records: &[LogRecord]) -> Vec<RecordedMove> {
    let Some(anchor) = records.iter().rposition(|r| legacy_candidate(r).is_some()) else {
        return Vec::new();
    };
    let Some(anchor_move) = legacy_candidate(&records[anchor]) else {
        return Vec::new();
    };
    let Some(mut later) = parse_timestamp(&records[anchor].timestamp) else {
        return Vec::new();
    };

    let max_gap = Duration::minutes(LEGACY_GAP_MINUTES);
    let mut batch = vec![anchor_move];

    for record in records[..anchor].iter().rev() {
        let Some(recorded) = legacy_candidate(record) else {
            break;
        };
        let Some(earlier) = parse_timestamp(&record.timestamp) else {
            break;
        };
        if (later - earlier).abs() > max_gap {
            break;
        }
        batch.push(recorded);
        later = earlier;
    }

    batch.reverse();
    batch
}

fn parse_timestamp(timestamp: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(timestamp).ok()
}
