//! Utility functions for Sprout.
//!
//! This module provides common utilities used across Sprout modules.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, SproutError};

/// Maximum file size that can be read into memory (10 MB).
///
/// Collections of short insights stay far below this; the limit guards
/// against importing the wrong file.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB

/// Read a file into a string with size limit protection.
///
/// # Errors
///
/// Returns an error if:
/// * The file cannot be read (doesn't exist, permission denied, etc.)
/// * The file exceeds `MAX_FILE_SIZE`
pub fn read_to_string_limited(path: &Path) -> Result<String> {
    read_to_string_with_limit(path, MAX_FILE_SIZE)
}

/// Read a file into a string with a custom size limit.
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let size = fs::metadata(path)
        .map_err(|e| SproutError::storage(path, e))?
        .len();
    if size > max_size {
        return Err(SproutError::validation(format!(
            "file {} is too large ({} bytes, max {} bytes)",
            path.display(),
            size,
            max_size
        )));
    }

    fs::read_to_string(path).map_err(|e| SproutError::storage(path, e))
}

/// Write a file atomically via a dot-prefixed temp file and rename.
///
/// Creates the parent directory if needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| SproutError::storage(parent, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SproutError::persistence(format!("no file name in {}", path.display())))?;
    let temp_path = parent.join(format!(".{}.tmp", file_name));

    {
        let mut file =
            fs::File::create(&temp_path).map_err(|e| SproutError::storage(&temp_path, e))?;
        file.write_all(contents)
            .map_err(|e| SproutError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| SproutError::storage(&temp_path, e))?;
    }

    // Rename is atomic on POSIX
    fs::rename(&temp_path, path).map_err(|e| SproutError::storage(path, e))
}

/// Shorten `text` to at most `max_chars` characters, ending in `...` if cut.
///
/// Newlines are collapsed to spaces so the result fits on one line.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let keep = max_chars.saturating_sub(3);
    let cut: String = single_line.chars().take(keep).collect();
    format!("{}...", cut.trim_end())
}
