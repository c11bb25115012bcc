//! Episode name parsing for series regrouping.
//!
//! Release names in the wild are wildly inconsistent, so season and episode
//! detection is an ordered list of pattern fallbacks rather than one brittle
//! regex. The order matters: changing it changes which pattern wins for
//! ambiguous names, so it is preserved exactly:
//!
//! 1. `<name> S<dd> E<dd>` (optional `EP`, optional spacing)
//! 2. compact `S<dddd>` (first digit pair is the season)
//! 3. `<d+>x<d+>`
//! 4. `<name> S<dd>` alone (episode defaults to 1)
//! 5. literal "movie" anywhere in the name
//! 6. no season at all (a valid outcome, not an error)
//!
//! Parsing is pure and never fails; absence of a match is represented as
//! `season: None` and the caller excludes the file from grouping.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static RE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[._-]+").expect("separator regex"));
static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("spaces regex"));

// The regex crate has no lookahead; the trailing (\D|$) accepts the same
// inputs as the original pattern's (?!\d).
static RE_NAME_SEASON_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s*s\d{1,2}\s*ep?\s*\d{1,2}").expect("name regex"));
static RE_NAME_SEASON_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s*s\d{1,2}(\D|$)").expect("name regex"));

static RE_SEASON_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)s(\d{1,2})\s*ep?\s*(\d{1,2})").expect("episode regex"));
static RE_COMPACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)s(\d{2})(\d{2})").expect("episode regex"));
static RE_CROSS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})x(\d{1,2})").expect("episode regex"));
static RE_SEASON_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)s(\d{1,2})(\D|$)").expect("episode regex"));

static RE_QUALITY_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(480p|720p|1080p|2160p|4k|8k|uhd|hd|sd)\b").expect("tag regex")
});
static RE_RELEASE_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(repack|proper|dirfix|dvdrip|webrip|hdtv|bluray)\b").expect("tag regex")
});

/// Series name used when no name pattern matches.
pub const UNKNOWN_SERIES: &str = "Unknown Series";

/// Sorting key for a season within a series.
///
/// Numeric seasons sort ascending; the `Movies` sentinel always sorts last
/// (the derived `Ord` gives this because `Movies` is declared after
/// `Number`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeasonKey {
    Number(u32),
    Movies,
}

impl SeasonKey {
    /// Returns the season folder name, e.g. `Season 02` or `Movies`.
    pub fn folder_name(&self) -> String {
        match self {
            SeasonKey::Number(n) => format!("Season {n:02}"),
            SeasonKey::Movies => "Movies".to_string(),
        }
    }
}

/// Result of parsing a filename for series information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeInfo {
    /// Normalized series name, `"Movies"` for movie items, or
    /// `"Unknown Series"` when no name pattern matched.
    pub series: String,
    /// `None` when no season was detected; the file is then excluded from
    /// grouping by the caller.
    pub season: Option<SeasonKey>,
    /// `None` for movies and unmatched files.
    pub episode: Option<u32>,
}

/// Parses a filename into series name, season, and episode.
pub fn parse_series(filename: &str) -> EpisodeInfo {
    let normalized = normalize_stem(filename);

    let (mut season, mut episode) = parse_season_episode(&normalized);
    let mut series = extract_series_name(&normalized);

    if season.is_none() && filename.to_lowercase().contains("movie") {
        season = Some(SeasonKey::Movies);
        series = "Movies".to_string();
        episode = None;
    }

    EpisodeInfo {
        series,
        season,
        episode,
    }
}

/// Parses just the series name from a filename.
///
/// Falls back to `"Unknown Series"` when no season pattern anchors the name.
pub fn parse_series_name(filename: &str) -> String {
    extract_series_name(&normalize_stem(filename))
}

/// Builds the standardized episode filename, e.g. `The Office S02E05.mkv`.
///
/// `extension` carries its leading dot (or is empty for extension-less
/// files).
pub fn standardized_name(series: &str, season: u32, episode: u32, extension: &str) -> String {
    format!("{series} S{season:02}E{episode:02}{extension}")
}

/// Collapses separator runs to single spaces and trims.
pub fn sanitize_series_name(name: &str) -> String {
    let spaced = RE_SEPARATORS.replace_all(name, " ");
    RE_SPACES.replace_all(&spaced, " ").trim().to_string()
}

/// Filename stem with `.`/`_`/`-` runs normalized to spaces.
fn normalize_stem(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());
    sanitize_series_name(&stem)
}

fn parse_season_episode(normalized: &str) -> (Option<SeasonKey>, Option<u32>) {
    if let Some(caps) = RE_SEASON_EPISODE.captures(normalized) {
        return (
            Some(SeasonKey::Number(digits(&caps[1]))),
            Some(digits(&caps[2])),
        );
    }

    if let Some(caps) = RE_COMPACT.captures(normalized) {
        return (
            Some(SeasonKey::Number(digits(&caps[1]))),
            Some(digits(&caps[2])),
        );
    }

    if let Some(caps) = RE_CROSS.captures(normalized) {
        return (
            Some(SeasonKey::Number(digits(&caps[1]))),
            Some(digits(&caps[2])),
        );
    }

    if let Some(caps) = RE_SEASON_ONLY.captures(normalized) {
        // Season folder or season pack without an episode marker.
        return (Some(SeasonKey::Number(digits(&caps[1]))), Some(1));
    }

    (None, None)
}

fn extract_series_name(normalized: &str) -> String {
    let raw = if let Some(caps) = RE_NAME_SEASON_EPISODE.captures(normalized) {
        caps[1].to_string()
    } else if let Some(caps) = RE_NAME_SEASON_ONLY.captures(normalized) {
        caps[1].to_string()
    } else {
        return UNKNOWN_SERIES.to_string();
    };

    let sanitized = sanitize_series_name(&raw);
    let stripped = RE_QUALITY_TAGS.replace_all(&sanitized, "");
    let stripped = RE_RELEASE_TAGS.replace_all(&stripped, "");
    sanitize_series_name(&stripped)
}

fn digits(s: &str) -> u32 {
    s.parse().unwrap_or(0)
}
