//! Command-line interface module.
//!
//! This module handles all CLI-related functionality including:
//! - Command parsing and validation
//! - Well-known directory name resolution
//! - Organization orchestration
//! - Undo operation handling
//! - Log listing

use crate::config::{AppConfig, default_directories};
use crate::organizer::{OrganizeOptions, Organizer, normalize_list};
use crate::output::OutputFormatter;
use crate::undo::UndoOptions;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Organize downloads and media libraries into category and series folders.
#[derive(Debug, Parser)]
#[command(name = "shelver", version, about)]
pub struct Cli {
    /// Path to a configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Organize a directory.
    Organize {
        /// Directory to organize: a path, or a well-known name like
        /// "downloads" or "desktop".
        directory: String,

        /// Simulate the run without moving anything.
        #[arg(long)]
        dry_run: bool,

        /// In downloads folders, move videos and images to the system
        /// Videos/Pictures directories first.
        #[arg(long)]
        move_media: bool,

        /// Only organize files with these extensions.
        #[arg(long = "include-ext", value_delimiter = ',')]
        include_ext: Vec<String>,

        /// Skip files with these extensions.
        #[arg(long = "exclude-ext", value_delimiter = ',')]
        exclude_ext: Vec<String>,

        /// Skip files with these exact names.
        #[arg(long = "exclude-name", value_delimiter = ',')]
        exclude_name: Vec<String>,

        /// Use this run identifier instead of a generated one.
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Undo the most recent run, or a specific one.
    Undo {
        /// Run identifier to undo.
        #[arg(long)]
        run_id: Option<String>,

        /// Show what would be restored without moving anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show recent operation log entries.
    Logs {
        /// Number of entries to show, newest first.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// List the well-known directory names and where they point.
    Dirs,
}

/// Runs the parsed CLI command.
///
/// This is the main entry point for CLI operations.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use shelver::cli::{Cli, run_cli};
///
/// let cli = Cli::parse();
/// if let Err(e) = run_cli(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<(), String> {
    let config = AppConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let organizer =
        Organizer::new(config).map_err(|e| format!("Error compiling filters: {}", e))?;

    match cli.command {
        Command::Organize {
            directory,
            dry_run,
            move_media,
            include_ext,
            exclude_ext,
            exclude_name,
            run_id,
        } => {
            let target = resolve_directory(&directory);
            let options = OrganizeOptions {
                dry_run,
                move_to_system_folders: move_media,
                include_extensions: normalize_list(include_ext),
                exclude_extensions: normalize_list(exclude_ext),
                exclude_names: normalize_list(exclude_name),
                run_id,
            };

            if dry_run {
                OutputFormatter::dry_run_notice(&format!(
                    "Analyzing contents of: {}",
                    target.display()
                ));
            } else {
                OutputFormatter::info(&format!("Organizing contents of: {}", target.display()));
            }

            let spinner = OutputFormatter::create_spinner("Organizing...");
            let result = organizer.organize(&target, &options);
            spinner.finish_and_clear();

            let summary = result.map_err(|e| e.to_string())?;

            if summary.preview.is_empty() {
                OutputFormatter::plain("No files found to organize.");
            } else {
                for outcome in &summary.preview {
                    OutputFormatter::outcome_line(outcome);
                }
            }
            OutputFormatter::run_summary(&summary);

            if !summary.dry_run && summary.moved_count > 0 {
                OutputFormatter::plain(&format!(
                    "Use 'shelver undo --run-id {}' to revert these changes.",
                    summary.run_id
                ));
            }
            if summary.error_count > 0 {
                OutputFormatter::error("Some files could not be organized. Please review errors above.");
            }
            Ok(())
        }

        Command::Undo { run_id, dry_run } => {
            let summary = organizer.undo_last_run(&UndoOptions { run_id, dry_run });
            for outcome in &summary.preview {
                OutputFormatter::outcome_line(outcome);
            }
            OutputFormatter::undo_summary(&summary);
            Ok(())
        }

        Command::Logs { limit } => {
            let records = organizer.recent_logs(limit);
            if records.is_empty() {
                OutputFormatter::plain("No log entries found.");
            } else {
                for record in &records {
                    OutputFormatter::log_line(record);
                }
            }
            Ok(())
        }

        Command::Dirs => {
            OutputFormatter::header("DIRECTORIES");
            for (name, path) in default_directories() {
                OutputFormatter::plain(&format!("{:<10} {}", name, path.display()));
            }
            Ok(())
        }
    }
}

/// Resolves a directory argument: well-known names map to their standard
/// locations, anything else is taken as a path.
fn resolve_directory(directory: &str) -> PathBuf {
    let key = directory.trim().to_lowercase();
    if let Some(path) = default_directories().get(&key) {
        return path.clone();
    }
    Path::new(directory).to_path_buf()
}
