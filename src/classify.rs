//! Media format classification by file extension

use std::fmt;
use std::path::Path;

/// Camera-vendor RAW extensions
pub const RAW_EXTENSIONS: &[&str] = &[
    "cr2", "cr3", // Canon
    "nef", "nrw", // Nikon
    "arw", "srf", "sr2", // Sony
    "raf", // Fujifilm
    "orf", // Olympus
    "rw2", // Panasonic
    "pef", "dng", // Pentax
    "raw", "rwl", // Leica
    "iiq", // Phase One
    "3fr", "fff", // Hasselblad
];

/// Video container extensions
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "wmv", "flv", "mkv", "m4v", "mpg", "mpeg", "3gp", "webm", "mts", "m2ts",
    "ts", "vob", "ogv", "dv", "qt",
];

/// Standard raster image extensions
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff"];

/// Category of a recognized media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaCategory {
    Image,
    Raw,
    Video,
}

impl MediaCategory {
    /// Classify an extension (case-insensitive, without the leading dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        let ext = ext.as_str();
        if RAW_EXTENSIONS.contains(&ext) {
            Some(MediaCategory::Raw)
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Some(MediaCategory::Video)
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            Some(MediaCategory::Image)
        } else {
            None
        }
    }

    /// Classify a path by its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaCategory::Image => "image",
            MediaCategory::Raw => "raw",
            MediaCategory::Video => "video",
        };
        f.write_str(name)
    }
}

/// Check whether a path names a recognized media file
pub fn is_media_file(path: &Path) -> bool {
    MediaCategory::from_path(path).is_some()
}

/// Lower-cased extension of a path, empty when absent
pub fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}
