//! xxHash-based content fingerprints for deduplication
//!
//! The whole file is streamed through a 128-bit xxHash3 in fixed-size
//! chunks, so memory use does not depend on file size.

use crate::error::{Error, Result};
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::trace;
use xxhash_rust::xxh3::Xxh3;

/// Size of each read chunk (64KB)
const CHUNK_SIZE: usize = 64 * 1024;

/// Digest of a file's full byte content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentFingerprint(u128);

impl ContentFingerprint {
    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Compute the content fingerprint of a file
pub fn compute_fingerprint(path: &Path) -> Result<ContentFingerprint> {
    let file = File::open(path)?;
    let fingerprint = fingerprint_reader(file).map_err(|e| Error::HashComputation {
        path: path.to_path_buf(),
        message: format!("Failed to read file: {}", e),
    })?;

    trace!(?path, %fingerprint, "Computed content fingerprint");
    Ok(fingerprint)
}

/// Stream a reader through the hasher until EOF
pub fn fingerprint_reader<R: Read>(mut reader: R) -> std::io::Result<ContentFingerprint> {
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(ContentFingerprint(hasher.digest128()))
}
