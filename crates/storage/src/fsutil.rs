// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Whole-file writes that readers observe as either old or new, never torn
//!
//! Bytes go to a temp file in the destination directory, are synced, and the
//! temp file is renamed over the destination.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Copy `src` over `dst` atomically, keeping `src`'s permissions. Returns bytes copied.
pub fn atomic_copy(src: &Path, dst: &Path) -> io::Result<u64> {
    let dir = parent_dir(dst);
    let mut reader = File::open(src)?;
    let permissions = reader.metadata()?.permissions();

    let mut tmp = NamedTempFile::new_in(dir)?;
    let copied = io::copy(&mut reader, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    std::fs::set_permissions(tmp.path(), permissions)?;
    tmp.persist(dst).map_err(|e| e.error)?;
    sync_dir(dir);
    Ok(copied)
}

/// Write `bytes` to `dst` atomically
pub fn atomic_write(dst: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = parent_dir(dst);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dst).map_err(|e| e.error)?;
    sync_dir(dir);
    Ok(())
}

/// Remove SQLite journal/WAL sidecars of `db` so a stale journal is never
/// replayed into a file restored underneath it. Returns how many were removed.
pub fn remove_sidecars(db: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for suffix in ["-journal", "-wal", "-shm"] {
        let mut name = db.as_os_str().to_owned();
        name.push(suffix);
        match std::fs::remove_file(&name) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}

fn sync_dir(dir: &Path) {
    // Directory fsync makes the rename durable; not supported everywhere.
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
}

#[cfg(test)]
#[path = "fsutil_tests.rs"]
mod tests;
