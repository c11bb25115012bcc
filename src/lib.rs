//! shelver - organize downloads and media libraries, reversibly
//!
//! This library provides utilities for classifying files into category
//! folders by extension, regrouping episodic media into series and season
//! hierarchies, recording every operation in an append-only JSONL log, and
//! undoing recorded runs, with filtering rules configurable via TOML.

pub mod category;
pub mod cli;
pub mod config;
pub mod episode;
pub mod mover;
pub mod oplog;
pub mod organizer;
pub mod output;
pub mod undo;

pub use category::{Category, CategoryMap};
pub use config::{AppConfig, CompiledFilters, ConfigError};
pub use episode::{EpisodeInfo, SeasonKey};
pub use mover::{MoveOutcome, Mover};
pub use oplog::{Action, LogRecord, OpLog, Status};
pub use organizer::{OrganizeError, OrganizeOptions, OrganizeSummary, Organizer};
pub use undo::{UndoEngine, UndoOptions, UndoSummary};

pub use cli::{Cli, Command, run_cli};
