//! Atomic file replacement.
//!
//! Contents go to a temp file in the destination directory, are synced,
//! then renamed over the target. Readers see the old file or the new one,
//! never a partial write.

use std::io::Write;
use std::path::Path;

use tracing::trace;

use crate::error::{Error, Result};

/// Atomically replace `path`, keeping the permissions of an existing file.
///
/// New files are created owner-only.
pub fn write(path: &Path, contents: &[u8]) -> Result<()> {
    write_with_mode(path, contents, existing_mode(path))
}

/// Atomically replace `path` with an owner-only (0600) file.
pub fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    write_with_mode(path, contents, Some(0o600))
}

fn write_with_mode(path: &Path, contents: &[u8], mode: Option<u32>) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".lockbox-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(mode))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    trace!(path = %path.display(), len = contents.len(), "replaced file");
    Ok(())
}

#[cfg(unix)]
fn existing_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .ok()
        .map(|m| m.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn existing_mode(_path: &Path) -> Option<u32> {
    None
}
