//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored
//! output, progress indication, and run summaries. This module abstracts
//! away output details, making it easy to change formatting globally.

use crate::mover::MoveOutcome;
use crate::oplog::{Action, LogRecord, Status};
use crate::organizer::OrganizeSummary;
use crate::undo::UndoSummary;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Spinners for in-flight runs
/// - Per-file outcome lines and run summaries
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shelver::output::OutputFormatter;
    /// OutputFormatter::success("Directory organized!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a spinner for an in-flight run.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shelver::output::OutputFormatter;
    /// let spinner = OutputFormatter::create_spinner("Organizing...");
    /// spinner.finish_and_clear();
    /// ```
    pub fn create_spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("Invalid spinner template"),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    }

    /// Prints one per-file outcome line, colored by status.
    pub fn outcome_line(outcome: &MoveOutcome) {
        let destination = outcome
            .destination
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        match outcome.status {
            Status::Success => {
                println!("  {} {} → {}", "✓".green(), outcome.source.display(), destination);
            }
            Status::Preview => {
                println!(
                    "  {} {} → {}",
                    "→".yellow(),
                    outcome.source.display(),
                    destination
                );
            }
            Status::Skipped => {
                println!(
                    "  {} {}: {}",
                    "-".dimmed(),
                    outcome.source.display(),
                    outcome.message.dimmed()
                );
            }
            Status::Error => {
                eprintln!(
                    "  {} {}: {}",
                    "✗".red(),
                    outcome.source.display(),
                    outcome.message
                );
            }
        }
    }

    /// Prints the closing summary of an organize run.
    pub fn run_summary(summary: &OrganizeSummary) {
        Self::header("SUMMARY");

        let moved_label = if summary.dry_run {
            "Would move"
        } else {
            "Moved"
        };
        println!(
            "{}: {}",
            moved_label,
            summary.moved_count.to_string().green()
        );
        if summary.series_count > 0 {
            println!("Series: {}", summary.series_count.to_string().cyan());
        }
        if summary.error_count > 0 {
            println!("Errors: {}", summary.error_count.to_string().red());
        }
        println!("Run id: {}", summary.run_id.dimmed());

        if summary.dry_run {
            Self::dry_run_notice("No files were modified.");
        }
    }

    /// Prints the closing summary of an undo run.
    pub fn undo_summary(summary: &UndoSummary) {
        if let Some(target) = &summary.target_run_id {
            Self::header("UNDO SUMMARY");
            println!("Target run: {}", target.dimmed());
            let undone_label = if summary.dry_run {
                "Would restore"
            } else {
                "Restored"
            };
            println!(
                "{}: {}",
                undone_label,
                summary.undone_count.to_string().green()
            );
            if summary.error_count > 0 {
                println!("Errors: {}", summary.error_count.to_string().red());
            }
            if summary.dry_run {
                Self::dry_run_notice("No files were modified.");
            }
        } else {
            Self::warning(&summary.message);
        }
    }

    /// Prints one historical log record for the `logs` listing.
    pub fn log_line(record: &LogRecord) {
        let action = match record.action {
            Action::Move => "move",
            Action::Group => "group",
            Action::Undo => "undo",
            Action::RunStart => "run-start",
            Action::RunEnd => "run-end",
            Action::UndoStart => "undo-start",
            Action::UndoEnd => "undo-end",
        };
        let status = match record.status {
            Status::Success => "success".green(),
            Status::Skipped => "skipped".dimmed(),
            Status::Error => "error".red(),
            Status::Preview => "preview".yellow(),
        };
        let run = record.run_id.as_deref().unwrap_or("-");

        println!(
            "{} {:<10} {:<8} {} {}",
            record.timestamp.dimmed(),
            action,
            status,
            run.dimmed(),
            record.message
        );
    }
}
