//! Replacing a target file with new bytes
//!
//! Both strategies leave the backup alone; rollback is the caller's job.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::ReplaceStrategy;
use crate::crash_point::{checkpoint, points};
use crate::errors::{EditorError, EditorResult};

/// Suffix of the staging file used by `AtomicRename`
pub const TEMP_SUFFIX: &str = ".tmp";

/// `<dir>/<file name><suffix>`, a sibling of the target on the same filesystem
pub fn sibling_path(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    target.with_file_name(name)
}

/// Writes the new bytes over `target` using the chosen strategy
pub fn replace(
    target: &Path,
    bytes: &[u8],
    strategy: ReplaceStrategy,
    fsync: bool,
) -> EditorResult<()> {
    match strategy {
        ReplaceStrategy::AtomicRename => replace_atomic(target, bytes, fsync),
        ReplaceStrategy::InPlace => replace_in_place(target, bytes, fsync),
    }
}

/// Stage into `<name>.tmp`, fsync, rename over the target, fsync the directory.
/// A crash at any point leaves either the old file or the new one.
fn replace_atomic(target: &Path, bytes: &[u8], fsync: bool) -> EditorResult<()> {
    let temp = sibling_path(target, TEMP_SUFFIX);
    write_file(&temp, bytes, fsync)?;

    if let Err(e) = checkpoint(points::SAVE_BEFORE_REPLACE) {
        let _ = fs::remove_file(&temp);
        return Err(EditorError::io_raw("replace", target, e));
    }

    fs::rename(&temp, target).map_err(|e| {
        let _ = fs::remove_file(&temp);
        EditorError::io_raw("rename over", target, e)
    })?;

    if fsync {
        fsync_parent(target)?;
    }
    Ok(())
}

/// Truncate and rewrite the target. Not crash-safe on its own: an
/// interruption leaves a partial file that only the backup can repair.
fn replace_in_place(target: &Path, bytes: &[u8], fsync: bool) -> EditorResult<()> {
    checkpoint(points::SAVE_BEFORE_REPLACE)
        .map_err(|e| EditorError::io_raw("replace", target, e))?;

    let mut file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(target)
        .map_err(|e| EditorError::io_raw("open for writing", target, e))?;

    // Two writes only so SAVE_MID_WRITE can fire with half the bytes on disk;
    // the format has no chunking requirement.
    let (head, tail) = bytes.split_at(bytes.len() / 2);
    file.write_all(head)
        .map_err(|e| EditorError::io_raw("write", target, e))?;
    checkpoint(points::SAVE_MID_WRITE).map_err(|e| EditorError::io_raw("write", target, e))?;
    file.write_all(tail)
        .map_err(|e| EditorError::io_raw("write", target, e))?;

    if fsync {
        file.sync_all()
            .map_err(|e| EditorError::io_raw("fsync", target, e))?;
    }
    Ok(())
}

/// Create or truncate `path` with `bytes`, optionally fsyncing it
pub fn write_file(path: &Path, bytes: &[u8], fsync: bool) -> EditorResult<()> {
    let mut file = File::create(path).map_err(|e| EditorError::io_raw("create", path, e))?;
    file.write_all(bytes)
        .map_err(|e| EditorError::io_raw("write", path, e))?;
    if fsync {
        file.sync_all()
            .map_err(|e| EditorError::io_raw("fsync", path, e))?;
    }
    Ok(())
}

/// fsync the directory containing `path` so a rename is durable
#[cfg(unix)]
pub fn fsync_parent(path: &Path) -> EditorResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let d = OpenOptions::new()
        .read(true)
        .open(dir)
        .map_err(|e| EditorError::io_raw("open directory", dir, e))?;
    d.sync_all()
        .map_err(|e| EditorError::io_raw("fsync directory", dir, e))
}

#[cfg(not(unix))]
pub fn fsync_parent(_path: &Path) -> EditorResult<()> {
    Ok(())
}
