//! Crash-safe file replacement.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing::warn;

/// Replace `path` with `contents` atomically.
///
/// The bytes go to a temp file in the same directory which is then renamed
/// over the target, so readers see either the old or the new file, never a
/// torn one. With `sync` the temp file and the directory are fsynced.
///
/// Once the rename has happened the new contents are in place, so a failed
/// directory fsync is logged and does not fail the write.
pub fn write_atomic(path: &Path, contents: &[u8], sync: bool) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".memdb-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    if sync {
        tmp.as_file().sync_all()?;
    }

    // On failure the temp file is dropped and removed.
    tmp.persist(path).map_err(|e| e.error)?;

    if sync {
        sync_dir_after_replace(dir);
    }
    Ok(())
}

fn sync_dir_after_replace(dir: &Path) {
    if let Err(e) = sync_dir(dir) {
        warn!(dir = %dir.display(), error = %e, "directory fsync failed after replace");
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
