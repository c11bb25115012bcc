/// File categorization by extension.
///
/// This module maps a lowercase file extension (without the dot) to a broad
/// category, which in turn names the folder files of that kind are organized
/// into. The mapping is a static table compiled once into a HashMap; it is
/// never mutated at runtime.
use std::collections::HashMap;

/// Video extensions, also used to redirect media to the system Videos folder.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mov", "wmv", "mkv", "flv", "webm", "m4v", "3gp",
];

/// Image extensions, also used to redirect media to the system Pictures folder.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "svg",
];

pub const DOCUMENT_EXTENSIONS: &[&str] = &["doc", "docx", "pdf", "txt", "rtf"];

pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "wma"];

pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz", "iso"];

pub const EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "msi", "dmg", "pkg"];

pub const CODE_EXTENSIONS: &[&str] = &[
    "js", "html", "css", "py", "java", "cpp", "c", "php", "xml", "json",
];

pub const PRESENTATION_EXTENSIONS: &[&str] = &["ppt", "pptx"];

pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx"];

/// Represents a broad file category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Video,
    Image,
    Document,
    Audio,
    Archive,
    Executable,
    Code,
    Presentation,
    Spreadsheet,
    /// Fallback for extensions absent from every table.
    Other,
}

impl Category {
    /// Returns the folder name files of this category are moved into.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelver::category::Category;
    ///
    /// assert_eq!(Category::Video.dir_name(), "Videos");
    /// assert_eq!(Category::Other.dir_name(), "Other Files");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Video => "Videos",
            Category::Image => "Images",
            Category::Document => "Documents",
            Category::Audio => "Audio",
            Category::Archive => "Archives",
            Category::Executable => "Executables",
            Category::Code => "Code",
            Category::Presentation => "Presentations",
            Category::Spreadsheet => "Spreadsheets",
            Category::Other => "Other Files",
        }
    }
}

/// Maps file extensions to categories.
///
/// Lookups are O(1) over a table built once from the static extension lists.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    extension_map: HashMap<&'static str, Category>,
}

impl CategoryMap {
    /// Creates a new `CategoryMap` with all standard mappings.
    pub fn new() -> Self {
        let mut extension_map = HashMap::new();

        let tables: &[(&[&str], Category)] = &[
            (VIDEO_EXTENSIONS, Category::Video),
            (IMAGE_EXTENSIONS, Category::Image),
            (DOCUMENT_EXTENSIONS, Category::Document),
            (AUDIO_EXTENSIONS, Category::Audio),
            (ARCHIVE_EXTENSIONS, Category::Archive),
            (EXECUTABLE_EXTENSIONS, Category::Executable),
            (CODE_EXTENSIONS, Category::Code),
            (PRESENTATION_EXTENSIONS, Category::Presentation),
            (SPREADSHEET_EXTENSIONS, Category::Spreadsheet),
        ];

        for (extensions, category) in tables {
            for ext in *extensions {
                extension_map.insert(*ext, *category);
            }
        }

        Self { extension_map }
    }

    /// Maps an extension to its category.
    ///
    /// Total: extensions absent from every table fall back to
    /// `Category::Other`. Matching is case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelver::category::{Category, CategoryMap};
    ///
    /// let map = CategoryMap::default();
    /// assert_eq!(map.classify("mkv"), Category::Video);
    /// assert_eq!(map.classify("xyz"), Category::Other);
    /// ```
    pub fn classify(&self, ext: &str) -> Category {
        self.extension_map
            .get(ext.to_lowercase().as_str())
            .copied()
            .unwrap_or(Category::Other)
    }

    /// Returns true if the extension belongs to the video table.
    pub fn is_video(&self, ext: &str) -> bool {
        self.classify(ext) == Category::Video
    }

    /// Returns true if the extension belongs to the image table.
    pub fn is_image(&self, ext: &str) -> bool {
        self.classify(ext) == Category::Image
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts the lowercase extension (no dot) from a file name.
///
/// Returns an empty string when the name has no extension.
pub fn file_extension(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
