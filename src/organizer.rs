//! Run orchestration
//!
//! Handles, one file at a time:
//! - Classifying files by extension
//! - Computing content fingerprints for deduplication
//! - Resolving capture dates
//! - Copying or moving files into the year/month/day tree
//! - Writing video info sidecars
//!
//! Seen fingerprints and statistics are owned by the [`Organizer`] and
//! handed back to the caller in a [`RunReport`] when the run ends.

use crate::classify::MediaCategory;
use crate::config::{Config, FileOperation};
use crate::error::{Error, Result};
use crate::hash::{ContentFingerprint, compute_fingerprint};
use crate::placement::plan_destination;
use crate::sidecar::write_sidecar;
use crate::time::video::{FfprobeVideoInfo, VideoInfoSource};
use crate::time::{CaptureDate, DateResolver};
use filetime::FileTime;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};
use walkdir::WalkDir;

/// Fingerprint -> destination chosen for the first file with that content
pub type SeenFingerprints = HashMap<ContentFingerprint, PathBuf>;

/// A discovered media file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub category: MediaCategory,
}

impl CandidateFile {
    /// `None` for files that are not recognized media
    pub fn from_path(path: &Path) -> Option<Self> {
        MediaCategory::from_path(path).map(|category| Self {
            path: path.to_path_buf(),
            category,
        })
    }
}

/// Result of processing a single file
#[derive(Debug, Clone)]
pub struct FileResult {
    /// Source file path
    pub source: PathBuf,
    /// Media category
    pub category: MediaCategory,
    /// Placed path, or the first copy's path for duplicates
    pub destination: Option<PathBuf>,
    /// Resolved capture date
    pub capture: Option<CaptureDate>,
    /// Processing status
    pub status: ProcessingStatus,
    /// Error message (if failed)
    pub error: Option<String>,
}

/// Terminal state of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    /// File was placed in the destination tree
    Processed,
    /// Content already seen in this run
    Duplicate,
    /// Processing failed
    Failed,
}

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub total_files: u64,
    pub raw_files: u64,
    pub video_files: u64,
    pub image_files: u64,
    pub duplicates: u64,
    pub errors: u64,
    pub space_saved_bytes: u64,
}

impl RunStatistics {
    fn record_category(&mut self, category: MediaCategory) {
        self.total_files += 1;
        match category {
            MediaCategory::Raw => self.raw_files += 1,
            MediaCategory::Video => self.video_files += 1,
            MediaCategory::Image => self.image_files += 1,
        }
    }

    fn record_duplicate(&mut self, size: u64) {
        self.duplicates += 1;
        self.space_saved_bytes += size;
    }

    /// Space saved in MiB
    pub fn space_saved_mb(&self) -> f64 {
        self.space_saved_bytes as f64 / (1024.0 * 1024.0)
    }

    /// One-line summary logged at the end of a run
    pub fn summary(&self) -> String {
        format!(
            "Total: {}, RAW: {}, Video: {}, Image: {}, Duplicates: {}, Errors: {}, Space saved: {:.2} MB",
            self.total_files,
            self.raw_files,
            self.video_files,
            self.image_files,
            self.duplicates,
            self.errors,
            self.space_saved_mb()
        )
    }

    /// Body of the completion notification
    pub fn notification_message(&self) -> String {
        format!(
            "Media organization complete\nTotal: {}\nRAW: {}\nVideo: {}\nImages: {}\nDuplicates: {}\nErrors: {}",
            self.total_files,
            self.raw_files,
            self.video_files,
            self.image_files,
            self.duplicates,
            self.errors
        )
    }
}

/// Final state of a run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stats: RunStatistics,
    pub results: Vec<FileResult>,
}

/// Organizes one source tree into the destination tree
pub struct Organizer {
    config: Config,
    resolver: DateResolver,
    video_info: Box<dyn VideoInfoSource>,
    seen: SeenFingerprints,
    stats: RunStatistics,
}

impl Organizer {
    /// Create an organizer with the default date resolver
    pub fn new(config: Config) -> Self {
        Self::with_resolver(config, DateResolver::default())
    }

    /// Create an organizer with a custom date resolver
    pub fn with_resolver(config: Config, resolver: DateResolver) -> Self {
        Self {
            config,
            resolver,
            video_info: Box::new(FfprobeVideoInfo),
            seen: SeenFingerprints::new(),
            stats: RunStatistics::default(),
        }
    }

    /// Replace the source of video sidecar fields
    pub fn with_video_info<V: VideoInfoSource + 'static>(mut self, source: V) -> Self {
        self.video_info = Box::new(source);
        self
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn seen(&self) -> &SeenFingerprints {
        &self.seen
    }

    /// Walk the source tree and process every media file
    ///
    /// Fails only when the source is not a directory or the destination
    /// cannot be created; per-file failures end up in the statistics.
    pub fn run(self) -> Result<RunReport> {
        let _span = span!(Level::INFO, "organizer_run").entered();

        let source = &self.config.source_dir;
        if !source.is_dir() {
            return Err(Error::InvalidSource(source.clone()));
        }

        info!(
            source = %source.display(),
            destination = %self.config.destination_dir.display(),
            operation = ?self.config.operation,
            "Starting media organization"
        );

        fs::create_dir_all(&self.config.destination_dir)?;
        debug!(destination = ?self.config.destination_dir, "Destination directory ready");

        let files = collect_files(source, &self.config.destination_dir)?;
        Ok(self.run_paths(files))
    }

    /// Process the given paths in order and finish the run
    pub fn run_paths<I>(mut self, paths: I) -> RunReport
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let results: Vec<FileResult> = paths
            .into_iter()
            .filter_map(|path| self.process_file(&path))
            .collect();

        self.finish(results)
    }

    /// Process one file; `None` when it is not a media file
    pub fn process_file(&mut self, path: &Path) -> Option<FileResult> {
        let candidate = CandidateFile::from_path(path)?;
        let _file_span = span!(Level::DEBUG, "process_file", ?path).entered();

        self.stats.record_category(candidate.category);
        debug!(?path, category = %candidate.category, "Processing file");

        match self.place(&candidate) {
            Ok(result) => Some(result),
            Err(e) => {
                error!(?path, error = %e, "Failed to process file");
                self.stats.errors += 1;
                Some(FileResult {
                    source: candidate.path,
                    category: candidate.category,
                    destination: None,
                    capture: None,
                    status: ProcessingStatus::Failed,
                    error: Some(e.to_string()),
                })
            }
        }
    }

    fn place(&mut self, candidate: &CandidateFile) -> Result<FileResult> {
        let path = candidate.path.as_path();
        let name = path
            .file_name()
            .ok_or_else(|| Error::InvalidFileName(path.to_path_buf()))?;
        let fingerprint = compute_fingerprint(path)?;

        if let Some(original) = self.seen.get(&fingerprint) {
            let size = fs::metadata(path)?.len();
            self.stats.record_duplicate(size);
            info!(?path, original = ?original, "Duplicate found");
            return Ok(FileResult {
                source: path.to_path_buf(),
                category: candidate.category,
                destination: Some(original.clone()),
                capture: None,
                status: ProcessingStatus::Duplicate,
                error: None,
            });
        }

        let capture = self.resolver.resolve(path, candidate.category);
        let dest = plan_destination(&self.config.destination_dir, &capture.timestamp, name)?;

        transfer(path, &dest, self.config.operation)?;
        self.seen.insert(fingerprint, dest.clone());

        if candidate.category == MediaCategory::Video {
            // Probe the placed copy, the source is gone after a move
            match self.video_info.video_info(&dest) {
                Ok(video_info) => {
                    write_sidecar(&dest, &video_info)?;
                }
                Err(e) => debug!(?dest, error = %e, "No video info available"),
            }
        }

        info!(
            source = ?path,
            destination = ?dest,
            time_source = ?capture.source,
            timestamp = %capture.timestamp,
            "Processed file"
        );

        Ok(FileResult {
            source: path.to_path_buf(),
            category: candidate.category,
            destination: Some(dest),
            capture: Some(capture),
            status: ProcessingStatus::Processed,
            error: None,
        })
    }

    fn finish(self, results: Vec<FileResult>) -> RunReport {
        let stats = self.stats;

        info!("Final statistics: {}", stats.summary());

        RunReport { stats, results }
    }
}

/// Regular files under `source` in a stable order, skipping `destination`
/// when it lies inside the source tree
///
/// A destination equal to the source is not skipped, so files are organized
/// in place. Everything is collected before the first write.
fn collect_files(source: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
    let source = fs::canonicalize(source)?;
    let destination = fs::canonicalize(destination)?;

    let mut files = Vec::new();
    let walker = WalkDir::new(&source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.path() != destination.as_path());

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Skipping unreadable entry"),
        }
    }

    debug!(count = files.len(), "Collected files from source tree");
    Ok(files)
}

/// Copy or move `source` to `dest`, keeping access and modification times
fn transfer(source: &Path, dest: &Path, operation: FileOperation) -> Result<()> {
    match operation {
        FileOperation::Copy => {
            debug!(?source, ?dest, "Copying file");
            copy_preserving_times(source, dest)?;
        }
        FileOperation::Move => {
            debug!(?source, ?dest, "Moving file");
            // Try rename first (faster for same filesystem)
            if fs::rename(source, dest).is_err() {
                // Fall back to copy + delete for cross-filesystem moves
                copy_preserving_times(source, dest)?;
                fs::remove_file(source)?;
            }
        }
    }
    Ok(())
}

fn copy_preserving_times(source: &Path, dest: &Path) -> Result<()> {
    let metadata = fs::metadata(source)?;
    fs::copy(source, dest)?;
    filetime::set_file_times(
        dest,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::date_directory;
    use crate::time::filesystem_time;
    use crate::time::video::VideoInfo;
    use tempfile::TempDir;

    /// Hands out the same fields for every video
    struct FixedInfo(VideoInfo);

    impl VideoInfoSource for FixedInfo {
        fn video_info(&self, _path: &Path) -> Result<VideoInfo> {
            Ok(self.0.clone())
        }
    }

    fn clip_info() -> VideoInfo {
        VideoInfo {
            duration: Some("0:00:05.000".into()),
            resolution: Some("1280x720".into()),
            format: Some("video/mp4".into()),
        }
    }

    fn write_dated(path: &Path, content: &[u8]) {
        fs::write(path, content).unwrap();
        filetime::set_file_mtime(path, FileTime::from_unix_time(1_433_160_000, 0)).unwrap();
    }

    fn setup() -> (TempDir, TempDir, Organizer) {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let organizer = Organizer::with_resolver(
            Config::new(src.path(), dst.path()),
            DateResolver::filesystem_only(),
        );
        (src, dst, organizer)
    }

    #[test]
    fn test_statistics_summary() {
        let mut stats = RunStatistics::default();
        stats.record_category(MediaCategory::Raw);
        stats.record_category(MediaCategory::Image);
        stats.record_category(MediaCategory::Image);
        stats.record_duplicate(3 * 1024 * 1024);
        stats.errors += 1;

        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.image_files, 2);

        let summary = stats.summary();
        assert!(summary.contains("Total: 3"));
        assert!(summary.contains("RAW: 1"));
        assert!(summary.contains("Duplicates: 1"));
        assert!(summary.contains("Errors: 1"));
        assert!(summary.contains("Space saved: 3.00 MB"));
    }

    #[test]
    fn test_notification_message() {
        let stats = RunStatistics {
            total_files: 10,
            raw_files: 2,
            video_files: 3,
            image_files: 5,
            duplicates: 1,
            errors: 0,
            space_saved_bytes: 42,
        };

        assert_eq!(
            stats.notification_message(),
            "Media organization complete\nTotal: 10\nRAW: 2\nVideo: 3\nImages: 5\nDuplicates: 1\nErrors: 0"
        );
    }

    #[test]
    fn test_non_media_is_ignored() {
        let (src, _dst, mut organizer) = setup();
        let path = src.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();

        assert!(organizer.process_file(&path).is_none());
        assert_eq!(organizer.stats().total_files, 0);
    }

    #[test]
    fn test_duplicate_is_not_placed_twice() {
        let (src, dst, mut organizer) = setup();
        let a = src.path().join("a.png");
        let b = src.path().join("b.png");
        fs::write(&a, b"same bytes").unwrap();
        fs::write(&b, b"same bytes").unwrap();

        let first = organizer.process_file(&a).unwrap();
        assert_eq!(first.status, ProcessingStatus::Processed);
        let placed = first.destination.unwrap();
        assert!(placed.starts_with(dst.path()));
        assert!(placed.exists());

        let second = organizer.process_file(&b).unwrap();
        assert_eq!(second.status, ProcessingStatus::Duplicate);
        assert_eq!(second.destination.as_ref(), Some(&placed));

        assert_eq!(organizer.seen().len(), 1);
        let stats = organizer.stats();
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.space_saved_bytes, b"same bytes".len() as u64);
    }

    #[test]
    fn test_missing_file_counts_as_error() {
        let (src, _dst, mut organizer) = setup();

        let result = organizer.process_file(&src.path().join("gone.jpg")).unwrap();
        assert_eq!(result.status, ProcessingStatus::Failed);
        assert!(result.error.is_some());
        assert_eq!(organizer.stats().errors, 1);
        assert_eq!(organizer.stats().total_files, 1);
    }

    #[test]
    fn test_run_paths_continues_after_error() {
        let (src, _dst, organizer) = setup();
        let good = src.path().join("good.gif");
        fs::write(&good, b"gif").unwrap();

        let report = organizer.run_paths(vec![
            src.path().join("missing.bmp"),
            src.path().join("readme.md"),
            good,
        ]);

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.stats.total_files, 2);
        assert_eq!(report.stats.errors, 1);
        assert_eq!(report.results[1].status, ProcessingStatus::Processed);
    }

    #[test]
    fn test_copy_preserves_modification_time() {
        let (src, _dst, mut organizer) = setup();
        let path = src.path().join("old.png");
        fs::write(&path, b"pixels").unwrap();
        let mtime = FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&path, mtime).unwrap();

        let result = organizer.process_file(&path).unwrap();
        let dest = result.destination.unwrap();

        let copied = fs::metadata(&dest).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&copied), mtime);
        assert!(path.exists());
    }

    #[test]
    fn test_sidecar_written_next_to_placed_video() {
        let (src, dst, organizer) = setup();
        let mut organizer = organizer.with_video_info(FixedInfo(clip_info()));
        fs::create_dir_all(src.path().join("x")).unwrap();
        fs::create_dir_all(src.path().join("y")).unwrap();
        let first = src.path().join("x/clip.mp4");
        let second = src.path().join("y/clip.mp4");
        write_dated(&first, b"first take");
        write_dated(&second, b"second take");

        let a = organizer.process_file(&first).unwrap().destination.unwrap();
        let b = organizer.process_file(&second).unwrap().destination.unwrap();

        assert!(a.starts_with(dst.path()));
        assert_eq!(b, a.with_file_name("clip_1.mp4"));
        assert_eq!(
            fs::read_to_string(a.with_file_name("clip_info.txt")).unwrap(),
            "duration: 0:00:05.000\nresolution: 1280x720\nformat: video/mp4\n"
        );
        assert!(b.with_file_name("clip_1_info.txt").exists());
        assert_eq!(organizer.stats().errors, 0);
    }

    #[test]
    fn test_images_get_no_sidecar() {
        let (src, dst, organizer) = setup();
        let mut organizer = organizer.with_video_info(FixedInfo(clip_info()));
        let path = src.path().join("still.png");
        write_dated(&path, b"pixels");

        organizer.process_file(&path).unwrap();

        let dir = date_directory(dst.path(), &filesystem_time(&path).unwrap());
        assert!(dir.join("still.png").exists());
        assert!(!dir.join("still_info.txt").exists());
    }

    #[test]
    fn test_sidecar_failure_counts_as_error() {
        let (src, dst, organizer) = setup();
        let mut organizer = organizer.with_video_info(FixedInfo(clip_info()));
        let path = src.path().join("clip.mov");
        write_dated(&path, b"frames");

        // A directory already sits where the sidecar should go
        let dir = date_directory(dst.path(), &filesystem_time(&path).unwrap());
        fs::create_dir_all(dir.join("clip_info.txt")).unwrap();

        let result = organizer.process_file(&path).unwrap();
        assert_eq!(result.status, ProcessingStatus::Failed);
        assert_eq!(organizer.stats().errors, 1);

        // The video itself was placed and stays known for deduplication
        assert!(dir.join("clip.mov").exists());
        assert_eq!(organizer.seen().len(), 1);
    }

    #[test]
    fn test_path_without_file_name() {
        let (src, _dst, mut organizer) = setup();
        let candidate = CandidateFile {
            path: src.path().join(".."),
            category: MediaCategory::Image,
        };

        let err = organizer.place(&candidate).unwrap_err();
        assert!(matches!(err, Error::InvalidFileName(_)));
    }

    #[test]
    fn test_invalid_source() {
        let dst = TempDir::new().unwrap();
        let config = Config::new(dst.path().join("does-not-exist"), dst.path().join("out"));

        let err = Organizer::new(config).run().unwrap_err();
        assert!(matches!(err, Error::InvalidSource(_)));
        assert!(!dst.path().join("out").exists());
    }
}
