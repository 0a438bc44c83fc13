//! Size-based rotation of the mirror log file, run once at startup.
//!
//! Keeps at most [`MAX_ROTATED_FILES`] numbered copies:
//!   mirror.log → mirror.log.1 → mirror.log.2 → … → mirror.log.5

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Maximum log file size before rotation (10 MiB).
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum number of rotated backup files to keep.
pub const MAX_ROTATED_FILES: usize = 5;

/// Rotate `log_file` with the default limits.
pub fn rotate_log(log_file: &Path) -> io::Result<bool> {
    rotate_if_needed(log_file, MAX_LOG_BYTES, MAX_ROTATED_FILES)
}

/// Rotate `log_path` if it has reached `max_bytes`.
///
/// Returns `true` if rotation occurred, `false` if the file was under the
/// threshold or does not exist yet. The live file is moved to `.1` and not
/// recreated; the log sink creates it on open.
pub fn rotate_if_needed(log_path: &Path, max_bytes: u64, max_files: usize) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if size < max_bytes || max_files == 0 {
        return Ok(false);
    }

    match fs::remove_file(numbered_path(log_path, max_files)) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    for n in (1..max_files).rev() {
        let src = numbered_path(log_path, n);
        if src.exists() {
            fs::rename(&src, numbered_path(log_path, n + 1))?;
        }
    }

    fs::rename(log_path, numbered_path(log_path, 1))?;
    Ok(true)
}

/// `<base>.<n>`, e.g. `mirror.log.2`.
fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let mut name = base.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{n}"));
    base.with_file_name(name)
}
