/// Integration tests for shelver
///
/// These tests simulate real-world usage scenarios, testing the complete
/// end-to-end functionality of the organizer.
///
/// Test categories:
/// 1. Generic category organization
/// 2. Collision handling and idempotence
/// 3. Dry-run mode verification
/// 4. Downloads media relocation
/// 5. Series regrouping
/// 6. Undo workflows, including legacy logs
use shelver::config::AppConfig;
use shelver::oplog::{Action, Status};
use shelver::organizer::{OrganizeOptions, Organizer, normalize_list};
use shelver::undo::UndoOptions;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A test fixture that sets up a temporary directory tree with a target
/// directory, system media folders, and an isolated operation log.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn videos_root(&self) -> PathBuf {
        self.path().join("Videos")
    }

    fn pictures_root(&self) -> PathBuf {
        self.path().join("Pictures")
    }

    /// Build an organizer whose system paths and log live inside the
    /// fixture.
    fn organizer(&self) -> Organizer {
        let mut config = AppConfig::default();
        config.paths.videos = self.videos_root();
        config.paths.pictures = self.pictures_root();
        config.paths.log_file = self.path().join("operations.jsonl");
        Organizer::new(config).expect("Failed to build organizer")
    }

    /// Create a file with content at a path relative to the fixture root,
    /// creating parent directories as needed.
    fn create_file(&self, rel_path: &str, content: &[u8]) {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    fn create_subdir(&self, rel_path: &str) {
        fs::create_dir_all(self.path().join(rel_path)).expect("Failed to create subdirectory");
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_dir(),
            "Directory should exist: {}",
            path.display()
        );
    }
}

// ============================================================================
// Generic category organization
// ============================================================================

#[test]
fn test_organize_generic_directory_by_category() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/report.pdf", b"pdf");
    fixture.create_file("inbox/photo.jpg", b"jpg");
    fixture.create_file("inbox/song.mp3", b"mp3");
    fixture.create_file("inbox/mystery.xyz", b"???");

    let organizer = fixture.organizer();
    let summary = organizer
        .organize(&fixture.path().join("inbox"), &OrganizeOptions::default())
        .expect("organize should succeed");

    assert_eq!(summary.moved_count, 4);
    assert_eq!(summary.error_count, 0);
    fixture.assert_file_exists("inbox/Documents/report.pdf");
    fixture.assert_file_exists("inbox/Images/photo.jpg");
    fixture.assert_file_exists("inbox/Audio/song.mp3");
    fixture.assert_file_exists("inbox/Other Files/mystery.xyz");
}

#[test]
fn test_organize_missing_directory_is_an_error() {
    let fixture = TestFixture::new();
    let organizer = fixture.organizer();

    let result = organizer.organize(
        &fixture.path().join("does-not-exist"),
        &OrganizeOptions::default(),
    );
    assert!(result.is_err());
    // Nothing was logged for the failed precondition.
    assert!(organizer.log().read_all().is_empty());
}

#[test]
fn test_collision_gets_counter_suffix() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/notes.txt", b"new");
    fixture.create_file("inbox/Documents/notes.txt", b"existing");

    let organizer = fixture.organizer();
    let summary = organizer
        .organize(&fixture.path().join("inbox"), &OrganizeOptions::default())
        .expect("organize should succeed");

    assert_eq!(summary.moved_count, 1);
    fixture.assert_file_exists("inbox/Documents/notes.txt");
    fixture.assert_file_exists("inbox/Documents/notes (1).txt");

    // A third file with the same name takes the next counter.
    fixture.create_file("inbox/notes.txt", b"third");
    organizer
        .organize(&fixture.path().join("inbox"), &OrganizeOptions::default())
        .expect("organize should succeed");
    fixture.assert_file_exists("inbox/Documents/notes (2).txt");
}

#[test]
fn test_second_run_is_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/report.pdf", b"pdf");

    let organizer = fixture.organizer();
    organizer
        .organize(&fixture.path().join("inbox"), &OrganizeOptions::default())
        .expect("first run");
    let second = organizer
        .organize(&fixture.path().join("inbox"), &OrganizeOptions::default())
        .expect("second run");

    // Everything already sits in subdirectories; nothing to move.
    assert_eq!(second.moved_count, 0);
    assert_eq!(second.error_count, 0);
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn test_option_filters_exclude_files() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/app.log", b"log");
    fixture.create_file("inbox/keep-me.txt", b"keep");
    fixture.create_file("inbox/report.pdf", b"pdf");

    let organizer = fixture.organizer();
    let options = OrganizeOptions {
        exclude_extensions: normalize_list(["log"]),
        exclude_names: normalize_list(["keep-me.txt"]),
        ..Default::default()
    };
    let summary = organizer
        .organize(&fixture.path().join("inbox"), &options)
        .expect("organize should succeed");

    assert_eq!(summary.moved_count, 1);
    fixture.assert_file_exists("inbox/app.log");
    fixture.assert_file_exists("inbox/keep-me.txt");
    fixture.assert_file_exists("inbox/Documents/report.pdf");
}

#[test]
fn test_include_whitelist_limits_organization() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/photo.jpg", b"jpg");
    fixture.create_file("inbox/report.pdf", b"pdf");

    let organizer = fixture.organizer();
    let options = OrganizeOptions {
        include_extensions: normalize_list(["jpg"]),
        ..Default::default()
    };
    let summary = organizer
        .organize(&fixture.path().join("inbox"), &options)
        .expect("organize should succeed");

    assert_eq!(summary.moved_count, 1);
    fixture.assert_file_exists("inbox/Images/photo.jpg");
    fixture.assert_file_exists("inbox/report.pdf");
}

#[test]
fn test_hidden_files_are_skipped_by_default() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/.hidden.txt", b"hidden");
    fixture.create_file("inbox/visible.txt", b"visible");

    let organizer = fixture.organizer();
    let summary = organizer
        .organize(&fixture.path().join("inbox"), &OrganizeOptions::default())
        .expect("organize should succeed");

    assert_eq!(summary.moved_count, 1);
    fixture.assert_file_exists("inbox/.hidden.txt");
    fixture.assert_file_exists("inbox/Documents/visible.txt");
}

// ============================================================================
// Dry-run mode
// ============================================================================

#[test]
fn test_dry_run_leaves_filesystem_unchanged() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/report.pdf", b"pdf");
    fixture.create_file("inbox/photo.jpg", b"jpg");

    let organizer = fixture.organizer();
    let options = OrganizeOptions {
        dry_run: true,
        ..Default::default()
    };
    let summary = organizer
        .organize(&fixture.path().join("inbox"), &options)
        .expect("dry run should succeed");

    assert!(summary.dry_run);
    assert_eq!(summary.moved_count, 2);
    fixture.assert_file_exists("inbox/report.pdf");
    fixture.assert_file_exists("inbox/photo.jpg");
    fixture.assert_file_not_exists("inbox/Documents");
    fixture.assert_file_not_exists("inbox/Images");

    for outcome in &summary.preview {
        assert_eq!(outcome.status, Status::Preview);
    }
}

#[test]
fn test_dry_run_predicts_real_run_destinations() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/report.pdf", b"pdf");
    fixture.create_file("inbox/song.mp3", b"mp3");

    let organizer = fixture.organizer();
    let dry = organizer
        .organize(
            &fixture.path().join("inbox"),
            &OrganizeOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .expect("dry run");
    let real = organizer
        .organize(&fixture.path().join("inbox"), &OrganizeOptions::default())
        .expect("real run");

    let dry_destinations: Vec<_> = dry.preview.iter().map(|o| o.destination.clone()).collect();
    let real_destinations: Vec<_> = real.preview.iter().map(|o| o.destination.clone()).collect();
    assert_eq!(dry_destinations, real_destinations);
}

// ============================================================================
// Downloads media relocation
// ============================================================================

#[test]
fn test_downloads_moves_media_to_system_folders() {
    let fixture = TestFixture::new();
    fixture.create_file("Downloads/clip.mp4", b"video");
    fixture.create_file("Downloads/photo.png", b"image");
    fixture.create_file("Downloads/report.pdf", b"pdf");

    let organizer = fixture.organizer();
    let options = OrganizeOptions {
        move_to_system_folders: true,
        ..Default::default()
    };
    let summary = organizer
        .organize(&fixture.path().join("Downloads"), &options)
        .expect("organize should succeed");

    assert_eq!(summary.moved_count, 3);
    fixture.assert_file_exists("Videos/clip.mp4");
    fixture.assert_file_exists("Pictures/photo.png");
    // Non-media files stay behind and are classified in place.
    fixture.assert_file_exists("Downloads/Documents/report.pdf");
}

#[test]
fn test_move_media_is_ignored_outside_downloads() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/clip.mp4", b"video");

    let organizer = fixture.organizer();
    let options = OrganizeOptions {
        move_to_system_folders: true,
        ..Default::default()
    };
    organizer
        .organize(&fixture.path().join("inbox"), &options)
        .expect("organize should succeed");

    // Classified locally, not relocated to the system Videos folder.
    fixture.assert_file_exists("inbox/Videos/clip.mp4");
    fixture.assert_file_not_exists("Videos/clip.mp4");
}

// ============================================================================
// Series regrouping
// ============================================================================

#[test]
fn test_series_regrouping_under_media_library() {
    let fixture = TestFixture::new();
    fixture.create_file("Videos/Incoming/The.Office.S02E05.mkv", b"ep");
    fixture.create_file("Videos/Incoming/The.Office.S02E06.720p.mkv", b"ep");
    fixture.create_file("Videos/Incoming/Dark.1x03.mp4", b"ep");
    fixture.create_file("Videos/Incoming/Holiday.Movie.2020.mp4", b"movie");
    fixture.create_file("Videos/Incoming/notes.txt", b"not an episode");

    let organizer = fixture.organizer();
    let summary = organizer
        .organize(&fixture.path().join("Videos/Incoming"), &OrganizeOptions::default())
        .expect("organize should succeed");

    assert_eq!(summary.series_count, 3);
    fixture.assert_file_exists("Videos/Incoming/The Office/Season 02/The Office S02E05.mkv");
    fixture.assert_file_exists("Videos/Incoming/The Office/Season 02/The Office S02E06.mkv");
    // NxM names carry no recognizable series name.
    fixture.assert_file_exists(
        "Videos/Incoming/Unknown Series/Season 01/Unknown Series S01E03.mp4",
    );
    // Movies keep their original filename under Movies/Movies.
    fixture.assert_file_exists("Videos/Incoming/Movies/Movies/Holiday.Movie.2020.mp4");
    // Files without a detected season stay where they are.
    fixture.assert_file_exists("Videos/Incoming/notes.txt");
}

#[test]
fn test_videos_root_itself_is_not_regrouped() {
    let fixture = TestFixture::new();
    fixture.create_file("Videos/The.Office.S02E05.mkv", b"ep");

    let organizer = fixture.organizer();
    organizer
        .organize(&fixture.videos_root(), &OrganizeOptions::default())
        .expect("organize should succeed");

    // The root is organized generically, not as a series subtree.
    fixture.assert_file_exists("Videos/Videos/The.Office.S02E05.mkv");
}

#[test]
fn test_season_folders_nest_under_show_folder() {
    let fixture = TestFixture::new();
    fixture.create_subdir("Videos/Incoming/Breaking Bad S01");
    fixture.create_subdir("Videos/Incoming/Breaking Bad S02");
    fixture.create_subdir("Videos/Incoming/Lone Show S01");
    fixture.create_file("Videos/Incoming/Breaking Bad S01/pilot.mkv", b"ep");

    let organizer = fixture.organizer();
    organizer
        .organize(&fixture.path().join("Videos/Incoming"), &OrganizeOptions::default())
        .expect("organize should succeed");

    fixture.assert_dir_exists("Videos/Incoming/Breaking Bad/Breaking Bad S01");
    fixture.assert_dir_exists("Videos/Incoming/Breaking Bad/Breaking Bad S02");
    fixture.assert_file_exists("Videos/Incoming/Breaking Bad/Breaking Bad S01/pilot.mkv");
    // A single season is left alone.
    fixture.assert_dir_exists("Videos/Incoming/Lone Show S01");
}

#[test]
fn test_series_collision_preserves_source_suffix() {
    let fixture = TestFixture::new();
    fixture.create_file(
        "Videos/Incoming/The Office/Season 02/The Office S02E05.mkv",
        b"existing",
    );
    fixture.create_file("Videos/Incoming/The Office S02E05 (Extended).mkv", b"new");

    let organizer = fixture.organizer();
    organizer
        .organize(&fixture.path().join("Videos/Incoming"), &OrganizeOptions::default())
        .expect("organize should succeed");

    fixture.assert_file_exists(
        "Videos/Incoming/The Office/Season 02/The Office S02E05 Office S02E05 (Extended).mkv",
    );
}

// ============================================================================
// Undo workflows
// ============================================================================

#[test]
fn test_organize_then_undo_restores_files() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/report.pdf", b"pdf");
    fixture.create_file("inbox/photo.jpg", b"jpg");

    let organizer = fixture.organizer();
    let summary = organizer
        .organize(&fixture.path().join("inbox"), &OrganizeOptions::default())
        .expect("organize should succeed");
    assert_eq!(summary.moved_count, 2);

    let undo = organizer.undo_last_run(&UndoOptions::default());
    assert_eq!(undo.undone_count, 2);
    assert_eq!(undo.error_count, 0);
    assert_eq!(undo.target_run_id.as_deref(), Some(summary.run_id.as_str()));
    fixture.assert_file_exists("inbox/report.pdf");
    fixture.assert_file_exists("inbox/photo.jpg");
    fixture.assert_file_not_exists("inbox/Documents/report.pdf");
    fixture.assert_file_not_exists("inbox/Images/photo.jpg");
}

#[test]
fn test_undo_skips_dry_runs_when_picking_target() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/report.pdf", b"pdf");

    let organizer = fixture.organizer();
    let real = organizer
        .organize(&fixture.path().join("inbox"), &OrganizeOptions::default())
        .expect("real run");
    // A later dry-run must not become the undo target.
    fixture.create_file("inbox/another.txt", b"txt");
    organizer
        .organize(
            &fixture.path().join("inbox"),
            &OrganizeOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .expect("dry run");

    let undo = organizer.undo_last_run(&UndoOptions::default());
    assert_eq!(undo.target_run_id.as_deref(), Some(real.run_id.as_str()));
    assert_eq!(undo.undone_count, 1);
    fixture.assert_file_exists("inbox/report.pdf");
}

#[test]
fn test_undo_with_no_history() {
    let fixture = TestFixture::new();
    let organizer = fixture.organizer();

    let undo = organizer.undo_last_run(&UndoOptions::default());
    assert_eq!(undo.undone_count, 0);
    assert_eq!(undo.message, "No previous run found to undo.");
    assert!(undo.undo_run_id.is_none());
}

#[test]
fn test_undo_legacy_log_without_run_ids() {
    let fixture = TestFixture::new();
    let moved = fixture.path().join("inbox/Documents/report.pdf");
    let origin = fixture.path().join("inbox/report.pdf");
    fixture.create_file("inbox/Documents/report.pdf", b"pdf");

    // A log written before run identifiers existed.
    let line = format!(
        concat!(
            r#"{{"timestamp":"2023-05-01T12:00:00+00:00","action":"move","status":"success","#,
            r#""source":"{}","destination":"{}","message":"moved"}}"#,
            "\n"
        ),
        origin.display(),
        moved.display()
    );
    let organizer = fixture.organizer();
    fs::write(organizer.log().path(), line).expect("write legacy log");

    let undo = organizer.undo_last_run(&UndoOptions::default());
    assert_eq!(undo.target_run_id.as_deref(), Some("legacy-batch"));
    assert_eq!(undo.undone_count, 1);
    fixture.assert_file_exists("inbox/report.pdf");
}

// ============================================================================
// Operation log
// ============================================================================

#[test]
fn test_run_is_bracketed_by_markers() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/report.pdf", b"pdf");

    let organizer = fixture.organizer();
    let summary = organizer
        .organize(&fixture.path().join("inbox"), &OrganizeOptions::default())
        .expect("organize should succeed");

    let records: Vec<_> = organizer
        .log()
        .read_all()
        .into_iter()
        .filter(|r| r.run_id.as_deref() == Some(summary.run_id.as_str()))
        .collect();

    assert_eq!(records.first().map(|r| r.action), Some(Action::RunStart));
    assert_eq!(records.last().map(|r| r.action), Some(Action::RunEnd));
    assert!(
        records
            .iter()
            .any(|r| r.action == Action::Move && r.status == Status::Success)
    );
}

#[test]
fn test_recent_logs_newest_first() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/report.pdf", b"pdf");

    let organizer = fixture.organizer();
    organizer
        .organize(&fixture.path().join("inbox"), &OrganizeOptions::default())
        .expect("organize should succeed");

    let recent = organizer.recent_logs(2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].action, Action::RunEnd);
}
