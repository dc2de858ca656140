//! Video info sidecar files

use crate::error::Result;
use crate::time::video::VideoInfo;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sidecar path for a placed file: `<stem>_info.txt` next to it
pub fn sidecar_path(placed: &Path) -> PathBuf {
    let mut name = placed.file_stem().unwrap_or_default().to_os_string();
    name.push("_info.txt");
    placed.with_file_name(name)
}

/// Render `key: value` lines
pub fn render(info: &VideoInfo) -> String {
    info.fields()
        .into_iter()
        .map(|(key, value)| format!("{}: {}\n", key, value))
        .collect()
}

/// Write the sidecar for `placed`; nothing is written when `info` is empty
pub fn write_sidecar(placed: &Path, info: &VideoInfo) -> Result<Option<PathBuf>> {
    if info.is_empty() {
        return Ok(None);
    }

    let path = sidecar_path(placed);
    fs::write(&path, render(info))?;
    debug!(?path, "Wrote video info sidecar");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("/out/2024/01/02/clip_1.mov")),
            PathBuf::from("/out/2024/01/02/clip_1_info.txt")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_sidecar_path_keeps_non_utf8_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let placed = Path::new("/out").join(OsStr::from_bytes(b"f\xeate.mov"));
        assert_eq!(
            sidecar_path(&placed).file_name().unwrap().as_bytes(),
            b"f\xeate_info.txt"
        );
    }

    #[test]
    fn test_write_sidecar() {
        let tmp = TempDir::new().unwrap();
        let placed = tmp.path().join("clip.mp4");
        let info = VideoInfo {
            duration: Some("0:00:12.000".into()),
            resolution: None,
            format: Some("video/mp4".into()),
        };

        let written = write_sidecar(&placed, &info).unwrap().unwrap();
        assert_eq!(written, tmp.path().join("clip_info.txt"));
        assert_eq!(
            fs::read_to_string(written).unwrap(),
            "duration: 0:00:12.000\nformat: video/mp4\n"
        );
    }

    #[test]
    fn test_empty_info_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let placed = tmp.path().join("clip.mp4");

        assert!(write_sidecar(&placed, &VideoInfo::default()).unwrap().is_none());
        assert!(!tmp.path().join("clip_info.txt").exists());
    }
}
