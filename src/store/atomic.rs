use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

pub(crate) const STAGING_PREFIX: &str = ".wikigraph.staging.";

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Pretty JSON with a trailing newline, swapped into place in one rename.
/// Used for the import state file and exported pallets.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;
    bytes.push(b'\n');
    replace_file(path, &bytes)
}

/// Plain text variant, used for the default config file.
pub fn write_text(path: &Path, text: &str) -> io::Result<()> {
    replace_file(path, text.as_bytes())
}

/// Readers of `path` see either the previous content or `bytes`, never a
/// partial file. The staging file lives next to the target so the rename
/// stays on one filesystem.
fn replace_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let staging = staging_path(path)?;
    let dir = staging
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)?;

    let result = stage(&staging, bytes)
        .and_then(|()| fs::rename(&staging, path))
        .and_then(|()| sync_dir(&dir));
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

fn stage(staging: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(staging)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn staging_path(target: &Path) -> io::Result<PathBuf> {
    let name = target.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("`{}` does not name a file", target.display()),
        )
    })?;

    let mut staged = OsString::from(STAGING_PREFIX);
    staged.push(name);
    staged.push(format!(
        ".{}.{}",
        std::process::id(),
        STAGING_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    Ok(target.with_file_name(staged))
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
