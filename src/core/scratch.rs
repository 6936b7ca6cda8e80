//! Transient owner-only files.
//!
//! Decrypted identities and plaintext documents handed to external tools
//! live in a `ScratchFile`. Dropping it overwrites the contents with zeros
//! and removes the file, on success, error and unwinding alike.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tempfile::TempPath;

use crate::error::Result;

/// A temp file holding sensitive bytes for the length of one operation.
pub(crate) struct ScratchFile {
    path: TempPath,
    len: usize,
}

impl ScratchFile {
    /// Write `contents` to a new owner-only temp file.
    pub(crate) fn create(contents: &[u8], suffix: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(".lockbox-")
            .suffix(suffix)
            .tempfile()?;

        // tempfile already creates 0600 on unix; make it explicit.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(contents)?;
        file.as_file().sync_all()?;

        Ok(Self {
            path: file.into_temp_path(),
            len: contents.len(),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        // TempPath removes the file after this runs.
        if let Ok(mut file) = OpenOptions::new().write(true).open(&*self.path) {
            let _ = file.write_all(&vec![0u8; self.len]);
            let _ = file.sync_all();
        }
    }
}

impl std::fmt::Debug for ScratchFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchFile").field("len", &self.len).finish()
    }
}
