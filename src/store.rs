//! Whole-file JSON persistence: atomic temp-then-rename writes and
//! timestamped backups. A crash mid-run never clobbers the previous good file.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tempfile::NamedTempFile;

/// Write compact JSON atomically (shard files; smallest payload for the front end).
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    write_atomic(path, |writer| {
        serde_json::to_writer(writer, value).map_err(std::io::Error::other)
    })
}

/// Write pretty-printed JSON atomically (database, index, registry).
pub fn write_json_pretty_atomic<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    write_atomic(path, |writer| {
        serde_json::to_writer_pretty(writer, value).map_err(std::io::Error::other)
    })
}

fn write_atomic(
    path: &Path,
    serialize: impl FnOnce(&mut BufWriter<&NamedTempFile>) -> std::io::Result<()>,
) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut writer = BufWriter::new(&temp);
    serialize(&mut writer)?;
    writer.flush()?;
    drop(writer);
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Copy an existing file to `<stem>_backup_<YYYYmmdd_HHMMSS><ext>` next to it.
/// Returns the backup path, or None when there is nothing to back up.
pub fn backup_existing(path: &Path) -> std::io::Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("backup");
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let backup = path.with_file_name(format!("{stem}_backup_{stamp}{ext}"));
    fs::copy(path, &backup)?;
    Ok(Some(backup))
}
