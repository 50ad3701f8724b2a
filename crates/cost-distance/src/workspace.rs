//! Scratch workspace of one solver call.

use access_common::AccessResult;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

const PREFIX: &str = "GRASSDATA_";

/// Uniquely named directory under the cache root.
///
/// The directory is removed by [`ScratchWorkspace::close`] or, on any other
/// exit path, when the value is dropped.
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
}

impl ScratchWorkspace {
    pub fn create(cache_root: &Path) -> AccessResult<Self> {
        std::fs::create_dir_all(cache_root)?;
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir_in(cache_root)?;
        debug!(path = %dir.path().display(), "Created scratch workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the workspace, reporting any error.
    pub fn close(self) -> AccessResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(path = %path.display(), "Removed scratch workspace");
        Ok(())
    }
}
