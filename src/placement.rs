//! Destination planning: date directories and collision-free names
//!
//! The free-name probe is check-then-act against the file system and
//! assumes a single writer to the destination tree.

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDateTime};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `root/YYYY/MM/DD` for a capture date
pub fn date_directory(root: &Path, timestamp: &NaiveDateTime) -> PathBuf {
    root.join(format!("{}", timestamp.year()))
        .join(format!("{:02}", timestamp.month()))
        .join(format!("{:02}", timestamp.day()))
}

/// First name in `dir` that does not exist yet
///
/// `name` itself when free, otherwise `stem_1.ext`, `stem_2.ext`, ...
pub fn resolve_collision(dir: &Path, name: &OsStr) -> Result<PathBuf> {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return Ok(candidate);
    }

    let as_path = Path::new(name);
    let stem = as_path.file_stem().unwrap_or_default();
    let extension = as_path.extension();

    (1u64..)
        .map(|i| dir.join(suffixed_name(stem, i, extension)))
        .find(|path| !path.exists())
        .ok_or_else(|| Error::NameExhausted {
            dir: dir.to_path_buf(),
            name: name.to_string_lossy().into_owned(),
        })
}

/// `stem_N.ext` built on OS strings so non-UTF-8 names survive
fn suffixed_name(stem: &OsStr, n: u64, extension: Option<&OsStr>) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!("_{}", n));
    if let Some(ext) = extension {
        name.push(".");
        name.push(ext);
    }
    name
}

/// Create the date directory and pick a free path for `name` inside it
pub fn plan_destination(root: &Path, timestamp: &NaiveDateTime, name: &OsStr) -> Result<PathBuf> {
    let dir = date_directory(root, timestamp);
    fs::create_dir_all(&dir)?;

    let dest = resolve_collision(&dir, name)?;
    debug!(?dest, "Planned destination");
    Ok(dest)
}
