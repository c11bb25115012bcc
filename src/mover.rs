//! Collision-safe move primitive.
//!
//! All filesystem mutations go through this module. A move never clobbers an
//! existing file: the destination is resolved first (same-file no-op,
//! counter-suffixed name, or for series regrouping a preserved trailing
//! fragment of the original name), then executed with a single atomic
//! rename. On failure the source is left untouched; there is no partial
//! mutation and no retry. Every attempt writes one log record.

use crate::oplog::{Action, LogRecord, OpLog, Status};
use same_file::is_same_file;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Longest trailing fragment worth preserving through a series rename.
const MAX_SUFFIX_LEN: usize = 50;

/// Resolved destination for a requested move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub final_path: PathBuf,
    /// True when source and desired destination are the same underlying
    /// file (identical device and inode); the move is then a no-op.
    pub same_file: bool,
}

/// Resolves a desired destination against what is already on disk.
///
/// A free path is final as-is; an occupied path owned by the same file is a
/// no-op; anything else gets a counter name: `name (1).ext`, `name (2).ext`,
/// and so on until a free path is found.
pub fn resolve(source: &Path, desired: &Path) -> io::Result<Resolution> {
    if !desired.exists() {
        return Ok(Resolution {
            final_path: desired.to_path_buf(),
            same_file: false,
        });
    }

    if is_same_file(source, desired)? {
        return Ok(Resolution {
            final_path: desired.to_path_buf(),
            same_file: true,
        });
    }

    Ok(Resolution {
        final_path: next_free_counter_path(desired),
        same_file: false,
    })
}

/// Series-regrouping variant of [`resolve`].
///
/// Before falling back to the numeric counter, tries inserting the original
/// filename's trailing fragment (capped at 50 characters) before the
/// extension, so disambiguating tokens like `(Extended)` survive the
/// standardized rename.
pub fn resolve_with_suffix(source: &Path, desired: &Path) -> io::Result<Resolution> {
    if !desired.exists() {
        return Ok(Resolution {
            final_path: desired.to_path_buf(),
            same_file: false,
        });
    }

    if is_same_file(source, desired)? {
        return Ok(Resolution {
            final_path: desired.to_path_buf(),
            same_file: true,
        });
    }

    if let Some(fragment) = trailing_fragment(source) {
        let (stem, ext) = split_name(desired);
        let candidate = desired
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(format!("{stem} {fragment}{ext}"));
        if !candidate.exists() {
            return Ok(Resolution {
                final_path: candidate,
                same_file: false,
            });
        }
    }

    Ok(Resolution {
        final_path: next_free_counter_path(desired),
        same_file: false,
    })
}

fn next_free_counter_path(desired: &Path) -> PathBuf {
    let (stem, ext) = split_name(desired);
    let dir = desired.parent().unwrap_or_else(|| Path::new(""));

    let mut counter = 1u32;
    loop {
        let candidate = dir.join(format!("{stem} ({counter}){ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Splits a path into stem and dotted extension (empty when there is none).
fn split_name(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}

/// Everything after the first whitespace run in the source's stem, when
/// short enough to be worth carrying over.
fn trailing_fragment(source: &Path) -> Option<String> {
    let (stem, _) = split_name(source);
    let idx = stem.find(char::is_whitespace)?;
    let fragment = stem[idx..].trim_start().to_string();
    (!fragment.is_empty() && fragment.len() < MAX_SUFFIX_LEN).then_some(fragment)
}

/// Result of one attempted move, as reported to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub action: Action,
    pub status: Status,
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub message: String,
}

impl MoveOutcome {
    /// True when the file was moved (or would be, in dry-run).
    pub fn is_applied(&self) -> bool {
        matches!(self.status, Status::Success | Status::Preview)
    }
}

/// Executes collision-safe moves and logs every attempt.
pub struct Mover<'a> {
    log: &'a OpLog,
}

impl<'a> Mover<'a> {
    pub fn new(log: &'a OpLog) -> Self {
        Self { log }
    }

    /// Moves a file into a category or system folder.
    pub fn apply_move(
        &self,
        source: &Path,
        desired: &Path,
        run_id: &str,
        dry_run: bool,
    ) -> MoveOutcome {
        self.apply(Action::Move, source, desired, run_id, dry_run, false)
    }

    /// Moves a file or folder as part of series regrouping; prefers the
    /// suffix-preserving resolution over the plain counter.
    pub fn apply_group(
        &self,
        source: &Path,
        desired: &Path,
        run_id: &str,
        dry_run: bool,
    ) -> MoveOutcome {
        self.apply(Action::Group, source, desired, run_id, dry_run, true)
    }

    /// Moves a file back to its recorded origin during undo.
    pub fn apply_undo(
        &self,
        source: &Path,
        desired: &Path,
        run_id: &str,
        dry_run: bool,
    ) -> MoveOutcome {
        self.apply(Action::Undo, source, desired, run_id, dry_run, false)
    }

    fn apply(
        &self,
        action: Action,
        source: &Path,
        desired: &Path,
        run_id: &str,
        dry_run: bool,
        prefer_suffix: bool,
    ) -> MoveOutcome {
        let resolution = if prefer_suffix {
            resolve_with_suffix(source, desired)
        } else {
            resolve(source, desired)
        };

        let resolution = match resolution {
            Ok(resolution) => resolution,
            Err(e) => {
                return self.record(
                    action,
                    Status::Error,
                    source,
                    desired,
                    run_id,
                    dry_run,
                    e.to_string(),
                );
            }
        };

        if resolution.same_file {
            return self.record(
                action,
                Status::Skipped,
                source,
                &resolution.final_path,
                run_id,
                dry_run,
                "Source and destination are the same file.",
            );
        }

        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| source.to_string_lossy().to_string());
        let verb = match action {
            Action::Group => "grouped",
            _ => "moved",
        };

        if dry_run {
            return self.record(
                action,
                Status::Preview,
                source,
                &resolution.final_path,
                run_id,
                dry_run,
                format!("{name} would be {verb}."),
            );
        }

        match fs::rename(source, &resolution.final_path) {
            Ok(()) => self.record(
                action,
                Status::Success,
                source,
                &resolution.final_path,
                run_id,
                dry_run,
                format!("{name} moved successfully."),
            ),
            Err(e) => self.record(
                action,
                Status::Error,
                source,
                desired,
                run_id,
                dry_run,
                e.to_string(),
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        action: Action,
        status: Status,
        source: &Path,
        destination: &Path,
        run_id: &str,
        dry_run: bool,
        message: impl Into<String>,
    ) -> MoveOutcome {
        let message = message.into();
        self.log.append(
            LogRecord::operation(
                run_id,
                action,
                status,
                source,
                Some(destination),
                message.clone(),
            )
            .with_dry_run(dry_run),
        );

        MoveOutcome {
            action,
            status,
            source: source.to_path_buf(),
            destination: Some(destination.to_path_buf()),
            message,
        }
    }
}
