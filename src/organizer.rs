//! Run orchestration: directory-type detection, filtering, and dispatch.
//!
//! One invocation is a run: the target directory is classified (media
//! library subtree, downloads-like folder, or generic), eligible entries
//! are enumerated once, and every matching file is driven through the
//! collision-safe mover with its outcome logged under the run's
//! identifier. The orchestrator is fail-soft: a single file's failure is
//! counted and logged but never aborts the remaining enumeration. Only the
//! missing-target-directory precondition surfaces as a hard error, before
//! any record is written.
//!
//! Single concurrent invocation per target directory and per log store is
//! a precondition: there is no cross-process locking, and a second writer
//! would race the "path does not exist" checks behind collision
//! resolution.

use crate::category::{CategoryMap, file_extension};
use crate::config::{AppConfig, CompiledFilters, ConfigError};
use crate::episode::{self, SeasonKey};
use crate::mover::{MoveOutcome, Mover};
use crate::oplog::{Action, LogRecord, OpLog, Status};
use crate::undo::{UndoEngine, UndoOptions, UndoSummary};
use chrono::Utc;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use uuid::Uuid;

/// Sibling season folders like "The Simpsons S01".
static RE_SEASON_FOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.*?)\s+s\d{2}$").expect("season folder regex"));

/// Errors that cross the core boundary as hard failures.
#[derive(Debug)]
pub enum OrganizeError {
    /// The target directory does not exist; nothing was logged or moved.
    DirectoryNotFound(PathBuf),
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryNotFound(path) => {
                write!(f, "Directory does not exist: {}", path.display())
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Recognized options for one organize invocation.
///
/// Extension and name sets are case-insensitive and expected pre-normalized
/// (see [`normalize_list`]); the CLI validates at the boundary before the
/// core sees them.
#[derive(Debug, Clone, Default)]
pub struct OrganizeOptions {
    /// Compute and report every decision without mutating the filesystem.
    pub dry_run: bool,
    /// In downloads-like folders, relocate video/image files to the
    /// configured system Videos/Pictures directories first.
    pub move_to_system_folders: bool,
    /// When non-empty, only these extensions are eligible.
    pub include_extensions: HashSet<String>,
    pub exclude_extensions: HashSet<String>,
    /// Lowercase basenames to skip.
    pub exclude_names: HashSet<String>,
    /// Override the auto-generated run identifier.
    pub run_id: Option<String>,
}

impl OrganizeOptions {
    /// Entry-level filter, checked in order: excluded name, excluded
    /// extension, then the include whitelist when one is set.
    pub fn should_skip_entry(&self, name: &str) -> bool {
        let normalized = name.trim().to_lowercase();
        let ext = file_extension(name);

        if self.exclude_names.contains(&normalized) {
            return true;
        }

        if self.exclude_extensions.contains(&ext) {
            return true;
        }

        if !self.include_extensions.is_empty() && !self.include_extensions.contains(&ext) {
            return true;
        }

        false
    }
}

/// Normalizes a list of user-supplied values into a lowercase set.
///
/// Each item may itself be a comma-separated list; blanks are dropped.
pub fn normalize_list<I, S>(items: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .flat_map(|item| {
            item.as_ref()
                .split(',')
                .map(|part| part.trim().to_lowercase())
                .collect::<Vec<_>>()
        })
        .filter(|part| !part.is_empty())
        .collect()
}

/// Generates an opaque per-invocation run identifier.
pub fn generate_run_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("run-{millis}-{}", &suffix[..6])
}

/// Aggregate result of one organize run.
#[derive(Debug)]
pub struct OrganizeSummary {
    pub run_id: String,
    pub dry_run: bool,
    /// Files moved, or that would move in dry-run.
    pub moved_count: usize,
    pub error_count: usize,
    /// Distinct series touched by a regrouping pass.
    pub series_count: usize,
    /// Ordered per-file outcomes.
    pub preview: Vec<MoveOutcome>,
}

/// How the target directory is treated, checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectoryKind {
    /// Strict subdirectory of the media library root: series regroup.
    MediaLibrary,
    /// Path contains "downloads": optional media relocation, then
    /// classification.
    Downloads,
    /// Anything else: classification into category folders.
    Generic,
}

/// Facade over the core: classification, grouping, logging, and undo.
pub struct Organizer {
    config: AppConfig,
    categories: CategoryMap,
    filters: CompiledFilters,
    log: OpLog,
}

impl Organizer {
    /// Builds an organizer from an immutable configuration, compiling its
    /// filter rules once.
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        let filters = config.compile_filters()?;
        let log = OpLog::new(config.paths.log_file.clone());
        Ok(Self {
            config,
            categories: CategoryMap::new(),
            filters,
            log,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn log(&self) -> &OpLog {
        &self.log
    }

    /// Organizes a directory, bracketing all operations with
    /// run-start/run-end markers under one run identifier.
    ///
    /// # Errors
    ///
    /// `DirectoryNotFound` when the target does not exist; no record of
    /// the run is written in that case.
    pub fn organize(
        &self,
        dir: &Path,
        options: &OrganizeOptions,
    ) -> OrganizeResult<OrganizeSummary> {
        if !dir.exists() {
            return Err(OrganizeError::DirectoryNotFound(dir.to_path_buf()));
        }

        let dry_run = options.dry_run;
        let run_id = options.run_id.clone().unwrap_or_else(generate_run_id);

        self.log.append(LogRecord::marker(
            &run_id,
            Action::RunStart,
            Some(dir),
            dry_run,
            if dry_run {
                "Dry-run started."
            } else {
                "Organization started."
            },
        ));

        let mover = Mover::new(&self.log);
        let mut preview = Vec::new();

        let (moved_count, error_count, series_count) = match self.classify_directory(dir) {
            DirectoryKind::MediaLibrary => {
                self.regroup_series(dir, options, &run_id, &mover, &mut preview)
            }
            DirectoryKind::Downloads => {
                let (moved, errors) =
                    self.organize_downloads(dir, options, &run_id, &mover, &mut preview);
                (moved, errors, 0)
            }
            DirectoryKind::Generic => {
                let (moved, errors) =
                    self.classify_into_categories(dir, options, &run_id, &mover, &mut preview);
                (moved, errors, 0)
            }
        };

        self.log.append(LogRecord::marker(
            &run_id,
            Action::RunEnd,
            Some(dir),
            dry_run,
            if dry_run {
                "Dry-run completed."
            } else {
                "Organization completed."
            },
        ));

        Ok(OrganizeSummary {
            run_id,
            dry_run,
            moved_count,
            error_count,
            series_count,
            preview,
        })
    }

    /// Reverses the most recent real run (or an explicitly targeted one).
    pub fn undo_last_run(&self, options: &UndoOptions) -> UndoSummary {
        UndoEngine::new(&self.log).undo_last_run(options)
    }

    /// Most recent log records, newest first.
    pub fn recent_logs(&self, limit: usize) -> Vec<LogRecord> {
        self.log.read_recent(limit)
    }

    fn classify_directory(&self, dir: &Path) -> DirectoryKind {
        // Case-insensitive comparison, component-wise so that e.g.
        // "VideosBackup" is not mistaken for a library subtree.
        let dir_lower = PathBuf::from(dir.to_string_lossy().to_lowercase());
        let videos_lower =
            PathBuf::from(self.config.paths.videos.to_string_lossy().to_lowercase());

        if dir_lower.starts_with(&videos_lower) && dir_lower != videos_lower {
            DirectoryKind::MediaLibrary
        } else if dir_lower.to_string_lossy().contains("downloads") {
            DirectoryKind::Downloads
        } else {
            DirectoryKind::Generic
        }
    }

    /// Snapshot of eligible file names, sorted for deterministic order.
    fn eligible_files(&self, dir: &Path, options: &OrganizeOptions) -> io::Result<Vec<String>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(dir)? {
            let Ok(entry) = entry else { continue };
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if options.should_skip_entry(&name) {
                continue;
            }
            if !self.filters.should_include(&entry.path()) {
                continue;
            }

            files.push(name);
        }

        files.sort();
        Ok(files)
    }

    /// Moves each eligible file into a category-named subfolder.
    fn classify_into_categories(
        &self,
        dir: &Path,
        options: &OrganizeOptions,
        run_id: &str,
        mover: &Mover<'_>,
        preview: &mut Vec<MoveOutcome>,
    ) -> (usize, usize) {
        let dry_run = options.dry_run;
        let files = match self.eligible_files(dir, options) {
            Ok(files) => files,
            Err(e) => {
                preview.push(self.read_failure(dir, Action::Move, run_id, dry_run, &e));
                return (0, 1);
            }
        };

        let mut moved = 0;
        let mut errors = 0;

        for name in files {
            let source = dir.join(&name);
            let category = self.categories.classify(&file_extension(&name));
            let target_dir = dir.join(category.dir_name());

            if let Err(e) = ensure_dir(&target_dir, dry_run) {
                preview.push(self.dir_failure(&source, &target_dir, run_id, dry_run, &e));
                errors += 1;
                continue;
            }

            let outcome = mover.apply_move(&source, &target_dir.join(&name), run_id, dry_run);
            tally(&outcome, &mut moved, &mut errors);
            preview.push(outcome);
        }

        (moved, errors)
    }

    /// Downloads-like folder: optionally relocate media to the system
    /// folders first, then classify whatever remains.
    fn organize_downloads(
        &self,
        dir: &Path,
        options: &OrganizeOptions,
        run_id: &str,
        mover: &Mover<'_>,
        preview: &mut Vec<MoveOutcome>,
    ) -> (usize, usize) {
        let dry_run = options.dry_run;
        let mut moved = 0;
        let mut errors = 0;

        if options.move_to_system_folders {
            let files = match self.eligible_files(dir, options) {
                Ok(files) => files,
                Err(e) => {
                    preview.push(self.read_failure(dir, Action::Move, run_id, dry_run, &e));
                    return (0, 1);
                }
            };

            for name in files {
                let ext = file_extension(&name);
                let system_dir = if self.categories.is_video(&ext) {
                    &self.config.paths.videos
                } else if self.categories.is_image(&ext) {
                    &self.config.paths.pictures
                } else {
                    continue;
                };

                let source = dir.join(&name);
                if let Err(e) = ensure_dir(system_dir, dry_run) {
                    preview.push(self.dir_failure(&source, system_dir, run_id, dry_run, &e));
                    errors += 1;
                    continue;
                }

                let outcome = mover.apply_move(&source, &system_dir.join(&name), run_id, dry_run);
                tally(&outcome, &mut moved, &mut errors);
                preview.push(outcome);
            }
        }

        let (classified, classify_errors) =
            self.classify_into_categories(dir, options, run_id, mover, preview);
        (moved + classified, errors + classify_errors)
    }

    /// Media library subtree: nest season folders, then regroup episode
    /// files under series/season hierarchies with standardized names.
    fn regroup_series(
        &self,
        dir: &Path,
        options: &OrganizeOptions,
        run_id: &str,
        mover: &Mover<'_>,
        preview: &mut Vec<MoveOutcome>,
    ) -> (usize, usize, usize) {
        let dry_run = options.dry_run;
        let (mut moved, mut errors) =
            self.group_season_folders(dir, run_id, dry_run, mover, preview);

        let files = match self.eligible_files(dir, options) {
            Ok(files) => files,
            Err(e) => {
                preview.push(self.read_failure(dir, Action::Group, run_id, dry_run, &e));
                return (moved, errors + 1, 0);
            }
        };

        // series -> season -> (original, standardized); files with no
        // detected season are left untouched.
        let mut series_map: BTreeMap<String, BTreeMap<SeasonKey, Vec<(String, String)>>> =
            BTreeMap::new();

        for name in files {
            let info = episode::parse_series(&name);
            let Some(season) = info.season else { continue };

            let standardized = match (season, info.episode) {
                (SeasonKey::Number(s), Some(e)) => {
                    episode::standardized_name(&info.series, s, e, &dotted_extension(&name))
                }
                _ => name.clone(),
            };

            series_map
                .entry(info.series)
                .or_default()
                .entry(season)
                .or_default()
                .push((name, standardized));
        }

        let series_count = series_map.len();

        for (series, seasons) in &series_map {
            let series_dir = dir.join(series);

            for (season, files) in seasons {
                let season_dir = series_dir.join(season.folder_name());

                if let Err(e) = ensure_dir(&season_dir, dry_run) {
                    for (original, _) in files {
                        preview.push(self.dir_failure(
                            &dir.join(original),
                            &season_dir,
                            run_id,
                            dry_run,
                            &e,
                        ));
                        errors += 1;
                    }
                    continue;
                }

                for (original, standardized) in files {
                    let outcome = mover.apply_group(
                        &dir.join(original),
                        &season_dir.join(standardized),
                        run_id,
                        dry_run,
                    );
                    tally(&outcome, &mut moved, &mut errors);
                    preview.push(outcome);
                }
            }
        }

        (moved, errors, series_count)
    }

    /// Nests sibling `<show> S<dd>` season folders under a show folder
    /// when two or more seasons of the same show sit at the top level.
    fn group_season_folders(
        &self,
        dir: &Path,
        run_id: &str,
        dry_run: bool,
        mover: &Mover<'_>,
        preview: &mut Vec<MoveOutcome>,
    ) -> (usize, usize) {
        let Ok(entries) = fs::read_dir(dir) else {
            return (0, 0);
        };

        let mut show_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(caps) = RE_SEASON_FOLDER.captures(&name) {
                let show = caps[1].trim().to_string();
                if !show.is_empty() {
                    show_map.entry(show).or_default().push(name);
                }
            }
        }

        let mut moved = 0;
        let mut errors = 0;

        for (show, mut folders) in show_map {
            if folders.len() < 2 {
                continue;
            }
            folders.sort();

            let show_dir = dir.join(&show);
            if let Err(e) = ensure_dir(&show_dir, dry_run) {
                for folder in &folders {
                    preview.push(self.dir_failure(&dir.join(folder), &show_dir, run_id, dry_run, &e));
                    errors += 1;
                }
                continue;
            }

            for folder in &folders {
                let source = dir.join(folder);
                if !source.is_dir() {
                    continue;
                }
                let outcome = mover.apply_group(&source, &show_dir.join(folder), run_id, dry_run);
                tally(&outcome, &mut moved, &mut errors);
                preview.push(outcome);
            }
        }

        (moved, errors)
    }

    fn read_failure(
        &self,
        dir: &Path,
        action: Action,
        run_id: &str,
        dry_run: bool,
        e: &io::Error,
    ) -> MoveOutcome {
        let message = format!("Could not read directory: {e}");
        self.log.append(
            LogRecord::operation(run_id, action, Status::Error, dir, None, message.clone())
                .with_dry_run(dry_run),
        );
        MoveOutcome {
            action,
            status: Status::Error,
            source: dir.to_path_buf(),
            destination: None,
            message,
        }
    }

    fn dir_failure(
        &self,
        source: &Path,
        target_dir: &Path,
        run_id: &str,
        dry_run: bool,
        e: &io::Error,
    ) -> MoveOutcome {
        let message = format!("Could not create {}: {e}", target_dir.display());
        self.log.append(
            LogRecord::operation(run_id, Action::Move, Status::Error, source, None, message.clone())
                .with_dry_run(dry_run),
        );
        MoveOutcome {
            action: Action::Move,
            status: Status::Error,
            source: source.to_path_buf(),
            destination: None,
            message,
        }
    }
}

/// Creates the directory unless this is a dry-run.
fn ensure_dir(dir: &Path, dry_run: bool) -> io::Result<()> {
    if dry_run || dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir)
}

fn tally(outcome: &MoveOutcome, moved: &mut usize, errors: &mut usize) {
    match outcome.status {
        Status::Success | Status::Preview => *moved += 1,
        Status::Error => *errors += 1,
        // Same-file no-ops count neither way.
        Status::Skipped => {}
    }
}

/// Extension with its leading dot, or empty.
fn dotted_extension(name: &str) -> String {
    let ext = file_extension(name);
    if ext.is_empty() {
        String::new()
    } else {
        format!(".{ext}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organizer_with_videos(videos: &Path) -> Organizer {
        let mut config = AppConfig::default();
        config.paths.videos = videos.to_path_buf();
        config.paths.log_file = std::env::temp_dir().join("shelver-test-unused.jsonl");
        Organizer::new(config).expect("organizer")
    }

    #[test]
    fn test_classify_directory_media_library() {
        let organizer = organizer_with_videos(Path::new("/home/user/Videos"));
        assert_eq!(
            organizer.classify_directory(Path::new("/home/user/Videos/The Office")),
            DirectoryKind::MediaLibrary
        );
        // The root itself is not a series subtree.
        assert_eq!(
            organizer.classify_directory(Path::new("/home/user/Videos")),
            DirectoryKind::Generic
        );
        // Similarly-named siblings are not library subtrees.
        assert_eq!(
            organizer.classify_directory(Path::new("/home/user/VideosBackup")),
            DirectoryKind::Generic
        );
    }

    #[test]
    fn test_classify_directory_downloads_case_insensitive() {
        let organizer = organizer_with_videos(Path::new("/home/user/Videos"));
        assert_eq!(
            organizer.classify_directory(Path::new("/home/user/Downloads")),
            DirectoryKind::Downloads
        );
        assert_eq!(
            organizer.classify_directory(Path::new("/mnt/DOWNLOADS/new")),
            DirectoryKind::Downloads
        );
    }

    #[test]
    fn test_classify_directory_generic() {
        let organizer = organizer_with_videos(Path::new("/home/user/Videos"));
        assert_eq!(
            organizer.classify_directory(Path::new("/home/user/Desktop")),
            DirectoryKind::Generic
        );
    }

    #[test]
    fn test_should_skip_entry_order() {
        let options = OrganizeOptions {
            exclude_names: normalize_list(["keep.txt"]),
            exclude_extensions: normalize_list(["log"]),
            include_extensions: normalize_list(["txt", "log"]),
            ..Default::default()
        };

        // Excluded name wins even though txt is included.
        assert!(options.should_skip_entry("keep.txt"));
        assert!(options.should_skip_entry("KEEP.TXT"));
        // Excluded extension wins over the include list.
        assert!(options.should_skip_entry("app.log"));
        // Included extension passes.
        assert!(!options.should_skip_entry("notes.txt"));
        // Not in the include whitelist.
        assert!(options.should_skip_entry("photo.jpg"));
    }

    #[test]
    fn test_should_skip_entry_no_filters() {
        let options = OrganizeOptions::default();
        assert!(!options.should_skip_entry("anything.xyz"));
        assert!(!options.should_skip_entry("noext"));
    }

    #[test]
    fn test_normalize_list() {
        let set = normalize_list(["MKV, mp4", " avi ", ""]);
        assert_eq!(set, normalize_list(["mkv", "mp4", "avi"]));
        assert!(set.contains("mkv"));
        assert!(set.contains("mp4"));
        assert!(set.contains("avi"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_generate_run_id_shape() {
        let id = generate_run_id();
        assert!(id.starts_with("run-"));
        assert_ne!(id, generate_run_id());
    }

    #[test]
    fn test_season_folder_pattern() {
        assert!(RE_SEASON_FOLDER.is_match("The Simpsons S01"));
        assert!(RE_SEASON_FOLDER.is_match("the simpsons s12"));
        assert!(!RE_SEASON_FOLDER.is_match("The Simpsons S01E02"));
        assert!(!RE_SEASON_FOLDER.is_match("S01"));
    }
}
