//! Application configuration and file filtering rules.
//!
//! Configuration is an immutable object constructed once at process start
//! and passed by reference into the orchestrator. It carries the system
//! media paths (the Videos library root, the Pictures folder), the
//! operation log location, and filtering rules, loaded from a TOML file:
//!
//! ```toml
//! [paths]
//! videos = "/home/user/Videos"
//! pictures = "/home/user/Pictures"
//! log_file = "/home/user/.shelver-logs.jsonl"
//!
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! extensions = ["part", "crdownload"]
//! patterns = ["*.tmp"]
//! regex = []
//! ```
//!
//! Every section is optional; missing values fall back to defaults derived
//! from the user profile directory (`HOME` / `USERPROFILE`).

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during configuration loading and filter compiling.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Immutable application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathSettings,
    pub filters: FilterRules,
}

/// System paths the organizer depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Media library root; subdirectories of it are series-regrouped.
    pub videos: PathBuf,
    /// Destination for images when moving media to system folders.
    pub pictures: PathBuf,
    /// Location of the append-only operation log.
    pub log_file: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        let home = user_profile_dir();
        Self {
            videos: home.join("Videos"),
            pictures: home.join("Pictures"),
            log_file: home.join(".shelver-logs.jsonl"),
        }
    }
}

/// Rules for which files are excluded from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Whether hidden files (starting with ".") are eligible. Defaults to
    /// false.
    pub enable_hidden_files: bool,
    pub exclude: ExcludeRules,
}

/// Exclusion rule lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g. "Thumbs.db").
    pub filenames: Vec<String>,
    /// File extensions to exclude, without the dot.
    pub extensions: Vec<String>,
    /// Glob patterns to exclude (e.g. "*.tmp").
    pub patterns: Vec<String>,
    /// Regex patterns to exclude, matched against the filename.
    pub regex: Vec<String>,
}

impl AppConfig {
    /// Load configuration with fallback to defaults.
    ///
    /// Attempts, in order:
    /// 1. the explicitly provided file,
    /// 2. `.shelver.toml` in the current directory,
    /// 3. `~/.config/shelver/config.toml`,
    /// 4. built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error only when a configuration file exists but cannot
    /// be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".shelver.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        let home_config = user_profile_dir()
            .join(".config")
            .join("shelver")
            .join("config.toml");
        if home_config.exists() {
            return Self::load_from_file(&home_config);
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile the filter rules into matchers.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Compiled filter rules for efficient per-file matching.
///
/// Glob and regex patterns are validated and compiled once so matching a
/// file does not reparse anything.
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Check if a file passes the configured filters.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return false;
        }

        if self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
        {
            return false;
        }

        true
    }
}

/// Resolves the user profile directory from `HOME` or `USERPROFILE`.
pub fn user_profile_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Well-known folder names resolved against the user profile directory.
///
/// A pure environment lookup used by the CLI to accept names like
/// "downloads" in place of full paths.
pub fn default_directories() -> BTreeMap<String, PathBuf> {
    let home = user_profile_dir();
    BTreeMap::from([
        ("downloads".to_string(), home.join("Downloads")),
        ("documents".to_string(), home.join("Documents")),
        ("pictures".to_string(), home.join("Pictures")),
        ("videos".to_string(), home.join("Videos")),
        ("desktop".to_string(), home.join("Desktop")),
        ("series".to_string(), home.join("Videos").join("Series")),
    ])
}
