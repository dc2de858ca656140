//! Capture date resolution
//!
//! Each media file gets exactly one capture date. Format-specific
//! extractors are tried in order and the first success wins:
//! - Container metadata via FFprobe (videos)
//! - Embedded EXIF tags (RAW files)
//! - EXIF `DateTime` (JPEG and TIFF images)
//!
//! When none of them applies or succeeds, the earlier of the file system
//! creation and modification times is used, and if even that cannot be read
//! the current local time is returned.

pub mod exif;
pub mod video;

use crate::classify::{MediaCategory, lowercase_extension};
use crate::error::Result;
use chrono::{DateTime, Local, NaiveDateTime};
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, trace, warn};

pub use self::exif::{ImageExifExtractor, RawExifExtractor};
pub use self::video::{FfprobeVideoInfo, VideoInfo, VideoInfoSource, VideoMetadataExtractor};

/// Source of the resolved timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// Container metadata of a video
    VideoMetadata,
    /// EXIF tags embedded in a RAW file
    RawExif,
    /// EXIF `DateTime` of a JPEG/TIFF image
    Exif,
    /// Earlier of file system creation and modification time
    FileSystem,
    /// Wall-clock time at resolution
    Now,
}

/// Resolved capture date of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureDate {
    /// The resolved timestamp (local time)
    pub timestamp: NaiveDateTime,
    /// Where it came from
    pub source: TimeSource,
}

/// A single metadata-based strategy for finding a capture date
///
/// Extractors report failures as errors; the resolver treats every error
/// as "try the next strategy".
pub trait DateExtractor {
    /// Source recorded when this extractor succeeds
    fn source(&self) -> TimeSource;

    /// Whether this extractor should be tried for a file
    fn applies_to(&self, category: MediaCategory, extension: &str) -> bool;

    /// Extract the capture date
    fn extract(&self, path: &Path) -> Result<NaiveDateTime>;
}

/// Ordered chain of extractors with a file system fallback
pub struct DateResolver {
    extractors: Vec<Box<dyn DateExtractor>>,
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(VideoMetadataExtractor),
            Box::new(RawExifExtractor),
            Box::new(ImageExifExtractor),
        ])
    }
}

impl DateResolver {
    /// Create a resolver trying `extractors` in the given order
    pub fn new(extractors: Vec<Box<dyn DateExtractor>>) -> Self {
        Self { extractors }
    }

    /// A resolver with no metadata extractors (file system fallback only)
    pub fn filesystem_only() -> Self {
        Self::new(Vec::new())
    }

    /// Resolve the capture date of a file. Never fails.
    pub fn resolve(&self, path: &Path, category: MediaCategory) -> CaptureDate {
        let ext = lowercase_extension(path);

        for extractor in &self.extractors {
            if !extractor.applies_to(category, &ext) {
                continue;
            }
            match extractor.extract(path) {
                Ok(timestamp) => {
                    debug!(?path, source = ?extractor.source(), %timestamp, "Resolved capture date");
                    return CaptureDate {
                        timestamp,
                        source: extractor.source(),
                    };
                }
                Err(e) => {
                    trace!(?path, source = ?extractor.source(), error = %e, "Extractor failed, trying next");
                }
            }
        }

        match filesystem_time(path) {
            Ok(timestamp) => {
                debug!(?path, %timestamp, "Using file system time");
                CaptureDate {
                    timestamp,
                    source: TimeSource::FileSystem,
                }
            }
            Err(e) => {
                // Misfiles into today's folder; kept as the last resort
                warn!(?path, error = %e, "Cannot stat file, using current time");
                CaptureDate {
                    timestamp: Local::now().naive_local(),
                    source: TimeSource::Now,
                }
            }
        }
    }
}

/// Earlier of the creation and modification times, as local time
///
/// Platforms that do not report a creation time fall back to the
/// modification time alone.
pub fn filesystem_time(path: &Path) -> Result<NaiveDateTime> {
    let metadata = fs::metadata(path)?;
    let modified = metadata.modified()?;
    let earliest = match metadata.created() {
        Ok(created) => created.min(modified),
        Err(_) => modified,
    };
    Ok(to_local(earliest))
}

fn to_local(time: SystemTime) -> NaiveDateTime {
    let datetime: DateTime<Local> = time.into();
    datetime.naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct Fixed(TimeSource, Option<NaiveDateTime>);

    impl DateExtractor for Fixed {
        fn source(&self) -> TimeSource {
            self.0
        }

        fn applies_to(&self, category: MediaCategory, _extension: &str) -> bool {
            category == MediaCategory::Image
        }

        fn extract(&self, path: &Path) -> Result<NaiveDateTime> {
            self.1.ok_or_else(|| Error::ExifRead {
                path: path.to_path_buf(),
                message: "no date".into(),
            })
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_first_success_wins() {
        let resolver = DateResolver::new(vec![
            Box::new(Fixed(TimeSource::VideoMetadata, None)),
            Box::new(Fixed(TimeSource::RawExif, Some(date(2020, 1, 2)))),
            Box::new(Fixed(TimeSource::Exif, Some(date(2021, 3, 4)))),
        ]);

        let resolved = resolver.resolve(Path::new("/nonexistent/a.jpg"), MediaCategory::Image);
        assert_eq!(resolved.timestamp, date(2020, 1, 2));
        assert_eq!(resolved.source, TimeSource::RawExif);
    }

    #[test]
    fn test_category_gating() {
        let resolver = DateResolver::new(vec![Box::new(Fixed(
            TimeSource::Exif,
            Some(date(2021, 3, 4)),
        ))]);

        let resolved = resolver.resolve(Path::new("/nonexistent/a.mp4"), MediaCategory::Video);
        assert_ne!(resolved.source, TimeSource::Exif);
    }

    #[test]
    fn test_filesystem_fallback_is_earliest_timestamp() {
        let mut file = NamedTempFile::with_suffix(".png").unwrap();
        file.write_all(b"not really a png").unwrap();
        file.flush().unwrap();

        let metadata = fs::metadata(file.path()).unwrap();
        let modified = metadata.modified().unwrap();
        let expected = match metadata.created() {
            Ok(created) => created.min(modified),
            Err(_) => modified,
        };

        let resolved = DateResolver::default().resolve(file.path(), MediaCategory::Image);
        assert_eq!(resolved.source, TimeSource::FileSystem);
        assert_eq!(resolved.timestamp, to_local(expected));
    }

    #[test]
    fn test_missing_file_uses_now() {
        let before = Local::now().naive_local();
        let resolved =
            DateResolver::filesystem_only().resolve(Path::new("/nonexistent/x.jpg"), MediaCategory::Image);
        let after = Local::now().naive_local();

        assert_eq!(resolved.source, TimeSource::Now);
        assert!(resolved.timestamp >= before && resolved.timestamp <= after);
    }
}
