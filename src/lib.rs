//! Media Organizer - deduplicate and date-sort photos, RAW files and videos
//!
//! This library provides functionality for organizing media files into a
//! `year/month/day` tree with support for:
//! - Extension-based classification into images, RAW files and videos
//! - Capture dates from video container metadata, RAW EXIF tags and JPEG/TIFF EXIF
//! - File system timestamp fallback
//! - xxHash-based content deduplication
//! - Collision-free file naming
//! - Video info sidecar files
//! - ntfy completion notifications

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod hash;
pub mod notify;
pub mod organizer;
pub mod placement;
pub mod sidecar;
pub mod time;

pub use classify::MediaCategory;
pub use cli::Cli;
pub use config::{Config, ConfigError, FileOperation, NtfyConfig};
pub use error::{Error, Result};
pub use hash::{ContentFingerprint, compute_fingerprint};
pub use notify::Notifier;
pub use organizer::{FileResult, Organizer, ProcessingStatus, RunReport, RunStatistics};
pub use time::{CaptureDate, DateExtractor, DateResolver, TimeSource, VideoInfo, VideoInfoSource};
