//! Atomic file operations
//!
//! Durable writes for the unit registry and version index follow the
//! write-then-rename pattern:
//!
//! 1. Write to a temporary file (.tmp)
//! 2. Call sync_all() to flush to disk
//! 3. Rename temp file to final path (atomic on most filesystems)
//!
//! The final file is either the old version, or the new version, never a
//! partial state.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;

/// Atomically write content to a file
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Atomically write content using a writer function
///
/// More efficient for large files since the content never has to be built
/// as a single string in memory.
pub fn atomic_write_with<P, F>(path: P, write_fn: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(&temp_path)?;
    write_fn(&mut file)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Clean up any leftover temp files from interrupted operations
///
/// Call this on startup to remove .tmp files left behind by crashes.
pub fn cleanup_temp_files<P: AsRef<Path>>(dir: P) -> Result<usize> {
    let dir = dir.as_ref();
    let mut cleaned = 0;

    if !dir.exists() {
        return Ok(0);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.extension().map(|e| e == "tmp").unwrap_or(false) {
            fs::remove_file(&path)?;
            cleaned += 1;
        }
    }

    Ok(cleaned)
}
