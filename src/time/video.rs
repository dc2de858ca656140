//! Video metadata extraction via FFprobe

use super::{DateExtractor, TimeSource};
use crate::classify::MediaCategory;
use crate::error::{Error, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Metadata keys for each date field, in priority order
const DATE_KEY_GROUPS: &[&[&str]] = &[
    // creation date
    &["creation_time", "com.apple.quicktime.creationdate"],
    // last modification
    &["modification_time", "modification_date"],
    // generic date
    &["date"],
];

/// Cached FFprobe availability check
static FFPROBE_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Check if ffprobe is available (cached)
fn is_ffprobe_available() -> bool {
    *FFPROBE_AVAILABLE.get_or_init(|| Command::new("ffprobe").arg("-version").output().is_ok())
}

/// Subset of `ffprobe -print_format json -show_format -show_streams`
#[derive(Debug, Default, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub format: Option<ProbeFormat>,
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProbeFormat {
    pub format_name: Option<String>,
    pub duration: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProbeStream {
    pub codec_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl ProbeOutput {
    /// Parse ffprobe JSON output
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// First parsable date, by key group, container tags before stream tags
    pub fn capture_time(&self) -> Option<NaiveDateTime> {
        let tag_maps: Vec<&HashMap<String, String>> = self
            .format
            .iter()
            .map(|f| &f.tags)
            .chain(self.streams.iter().map(|s| &s.tags))
            .collect();

        for keys in DATE_KEY_GROUPS {
            for tags in &tag_maps {
                for key in *keys {
                    if let Some((tag_key, value)) =
                        tags.iter().find(|(k, _)| k.eq_ignore_ascii_case(key))
                        && let Some(dt) = parse_video_datetime(value)
                    {
                        trace!(key = %tag_key, %value, "Found video date tag");
                        return Some(dt);
                    }
                }
            }
        }

        None
    }
}

/// Run ffprobe against a file
pub fn probe(path: &Path) -> Result<ProbeOutput> {
    if !is_ffprobe_available() {
        return Err(Error::FfprobeNotFound);
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| Error::VideoMetadata {
            path: path.to_path_buf(),
            message: format!("Failed to execute ffprobe: {}", e),
        })?;

    if !output.status.success() {
        return Err(Error::VideoMetadata {
            path: path.to_path_buf(),
            message: format!(
                "FFprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    trace!(?path, "FFprobe output: {}", json_str);

    ProbeOutput::from_json(&json_str).map_err(|e| Error::VideoMetadata {
        path: path.to_path_buf(),
        message: format!("Failed to parse FFprobe JSON: {}", e),
    })
}

/// Reads creation/modification dates from the video container
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoMetadataExtractor;

impl DateExtractor for VideoMetadataExtractor {
    fn source(&self) -> TimeSource {
        TimeSource::VideoMetadata
    }

    fn applies_to(&self, category: MediaCategory, _extension: &str) -> bool {
        category == MediaCategory::Video
    }

    fn extract(&self, path: &Path) -> Result<NaiveDateTime> {
        probe(path)?
            .capture_time()
            .ok_or_else(|| Error::VideoMetadata {
                path: path.to_path_buf(),
                message: "No creation time found in video metadata".to_string(),
            })
    }
}

/// Parse a video metadata date
///
/// Zoned timestamps are converted to local time; naive ones are taken as is.
pub fn parse_video_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    let parsed = if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        Some(dt.with_timezone(&Local).naive_local())
    } else if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        Some(dt.with_timezone(&Local).naive_local())
    } else {
        [
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y:%m:%d %H:%M:%S",
        ]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
    }?;

    // QuickTime writes its 1904 epoch when no date was set
    if parsed.date() <= NaiveDate::from_ymd_opt(1904, 1, 2)? {
        debug!(value = s, "Ignoring unset QuickTime date");
        return None;
    }

    Some(parsed)
}

/// Descriptive fields written to a video's sidecar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoInfo {
    pub duration: Option<String>,
    pub resolution: Option<String>,
    pub format: Option<String>,
}

impl VideoInfo {
    /// Build from probe output; `path` is used to name the container MIME type
    pub fn from_probe(probe: &ProbeOutput, path: &Path) -> Self {
        let duration = probe
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(format_duration);

        let resolution = probe
            .streams
            .iter()
            .filter(|s| s.codec_type.as_deref() == Some("video"))
            .find_map(|s| match (s.width, s.height) {
                (Some(w), Some(h)) if w > 0 && h > 0 => Some(format!("{}x{}", w, h)),
                _ => None,
            });

        let format = probe
            .format
            .as_ref()
            .and_then(|f| container_mime(f, path));

        Self {
            duration,
            resolution,
            format,
        }
    }

    /// Available fields as `(key, value)` pairs in sidecar order
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("duration", self.duration.as_deref()),
            ("resolution", self.resolution.as_deref()),
            ("format", self.format.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

/// Probe a video file for its sidecar fields
pub fn extract_video_info(path: &Path) -> Result<VideoInfo> {
    let probe = probe(path)?;
    Ok(VideoInfo::from_probe(&probe, path))
}

/// Where the organizer gets sidecar fields for a placed video
pub trait VideoInfoSource {
    fn video_info(&self, path: &Path) -> Result<VideoInfo>;
}

/// Reads sidecar fields with ffprobe
#[derive(Debug, Clone, Copy, Default)]
pub struct FfprobeVideoInfo;

impl VideoInfoSource for FfprobeVideoInfo {
    fn video_info(&self, path: &Path) -> Result<VideoInfo> {
        extract_video_info(path)
    }
}

/// ffprobe demuxer names and the MIME type they stand for
const DEMUXER_MIME_TYPES: &[(&str, &str)] = &[
    ("matroska", "video/x-matroska"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
    ("flv", "video/x-flv"),
    ("asf", "video/x-ms-asf"),
    ("mpegts", "video/mp2t"),
    ("mpeg", "video/mpeg"),
    ("ogg", "video/ogg"),
];

/// MIME type of the probed container
///
/// The mov/mp4 demuxer covers the whole ISO-BMFF family, so `major_brand`
/// picks the member. Demuxers listing several formats (`matroska,webm`)
/// prefer the one matching the extension. Unknown containers fall back to
/// the extension; nothing is reported when ffprobe named no container.
fn container_mime(format: &ProbeFormat, path: &Path) -> Option<String> {
    let names: Vec<&str> = format
        .format_name
        .as_deref()?
        .split(',')
        .map(str::trim)
        .collect();

    let by_extension = mime_guess::from_path(path)
        .into_iter()
        .find(|m| m.type_() == mime_guess::mime::VIDEO)
        .map(|m| m.essence_str().to_string());

    if names.contains(&"mov") || names.contains(&"mp4") {
        let brand = format
            .tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("major_brand"))
            .map(|(_, v)| v.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let mime = match brand.as_str() {
            "qt" => "video/quicktime",
            b if b.starts_with("3g2") => "video/3gpp2",
            b if b.starts_with("3gp") => "video/3gpp",
            _ => "video/mp4",
        };
        return Some(mime.to_string());
    }

    let candidates: Vec<&str> = names
        .iter()
        .filter_map(|name| {
            DEMUXER_MIME_TYPES
                .iter()
                .find(|(demuxer, _)| demuxer == name)
                .map(|(_, mime)| *mime)
        })
        .collect();

    match by_extension {
        Some(ext) if candidates.is_empty() || candidates.contains(&ext.as_str()) => Some(ext),
        _ => candidates.first().map(|m| m.to_string()),
    }
}

/// Format seconds as `H:MM:SS.mmm`
fn format_duration(secs: f64) -> String {
    let total_ms = (secs * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    format!(
        "{}:{:02}:{:02}.{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        ms
    )
}
