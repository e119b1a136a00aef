use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Throwaway `--dbpath` directory.
///
/// Not removed on drop; ownership passes to the server handle, which calls
/// [`StorageDir::remove`] during teardown. Removing twice is a no-op.
#[derive(Debug)]
pub struct StorageDir {
    path: PathBuf,
    removed: bool,
}

impl StorageDir {
    /// Create a fresh `memongo-*` directory under the system temp dir.
    pub fn create() -> Result<Self> {
        let temp = tempfile::Builder::new()
            .prefix("memongo-")
            .tempdir()
            .map_err(|e| Error::Storage {
                path: std::env::temp_dir(),
                source: e,
            })?;
        let path = temp.keep();
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Delete the directory and everything in it.
    pub fn remove(&mut self) -> Result<()> {
        if self.removed {
            return Ok(());
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::Storage {
                    path: self.path.clone(),
                    source: e,
                })
            }
        }
        self.removed = true;
        Ok(())
    }

    /// Best-effort removal used while unwinding a failed startup.
    pub(crate) fn remove_logged(&mut self) {
        if let Err(e) = self.remove() {
            tracing::warn!("error removing data directory: {}", e);
        }
    }
}
