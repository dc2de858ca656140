//! EXIF time extraction for RAW files and JPEG/TIFF images

use super::{DateExtractor, TimeSource};
use crate::classify::MediaCategory;
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// Textual EXIF date layout
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// RAW tags to try, in priority order
const RAW_DATE_TAGS: &[Tag] = &[
    Tag::DateTimeOriginal,  // When the original image was taken
    Tag::DateTimeDigitized, // "CreateDate"
    Tag::DateTime,          // "ModifyDate"
];

/// Image extensions whose EXIF block is consulted
const EXIF_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "tiff"];

/// Reads the capture date embedded in a RAW container
#[derive(Debug, Clone, Copy, Default)]
pub struct RawExifExtractor;

impl DateExtractor for RawExifExtractor {
    fn source(&self) -> TimeSource {
        TimeSource::RawExif
    }

    fn applies_to(&self, category: MediaCategory, _extension: &str) -> bool {
        category == MediaCategory::Raw
    }

    fn extract(&self, path: &Path) -> Result<NaiveDateTime> {
        let exif = read_exif(path)?;
        first_date(path, &exif, RAW_DATE_TAGS)
    }
}

/// Reads EXIF `DateTime` from JPEG and TIFF images
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageExifExtractor;

impl DateExtractor for ImageExifExtractor {
    fn source(&self) -> TimeSource {
        TimeSource::Exif
    }

    fn applies_to(&self, category: MediaCategory, extension: &str) -> bool {
        category == MediaCategory::Image && EXIF_IMAGE_EXTENSIONS.contains(&extension)
    }

    fn extract(&self, path: &Path) -> Result<NaiveDateTime> {
        let exif = read_exif(path)?;
        first_date(path, &exif, &[Tag::DateTime])
    }
}

/// Parse the EXIF block of a file; the handle is dropped on return
fn read_exif(path: &Path) -> Result<Exif> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| Error::ExifRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Try each tag in order; a malformed value moves on to the next tag
fn first_date(path: &Path, exif: &Exif, tags: &[Tag]) -> Result<NaiveDateTime> {
    for tag in tags {
        let Some(field) = exif.get_field(*tag, In::PRIMARY) else {
            continue;
        };
        if let Value::Ascii(ref values) = field.value
            && let Some(datetime) = values
                .first()
                .and_then(|raw| std::str::from_utf8(raw).ok())
                .and_then(parse_exif_datetime)
        {
            trace!(?path, ?tag, "Found EXIF date");
            return Ok(datetime);
        }
    }

    Err(Error::ExifRead {
        path: path.to_path_buf(),
        message: "No valid date tag found in EXIF data".to_string(),
    })
}

/// Parse EXIF datetime string format: "YYYY:MM:DD HH:MM:SS"
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    // Some writers pad the fixed-size field with NULs
    let s = s.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(s, EXIF_DATETIME_FORMAT).ok()
}
