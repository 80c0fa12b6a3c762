//! Request-scoped directories under the scratch root
//!
//! Every staging, download and packaging directory is a [`ScratchDir`].
//! Completed operations delete it with [`ScratchDir::close`] on the async
//! runtime. On early returns and `?` propagation the guard's `Drop` deletes it
//! instead. A directory whose contents are the result handed back to the
//! caller is released with [`ScratchDir::keep`].

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Prefix of upload staging directories
pub const UPLOAD_STAGING_PREFIX: &str = "genome-upload-staging";

/// Prefix of download working directories
pub const DOWNLOAD_WORKING_PREFIX: &str = "genome-download";

#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    armed: bool,
}

impl ScratchDir {
    /// Create `<root>/<prefix>-<uuid>`
    pub async fn create(root: &Path, prefix: &str) -> io::Result<Self> {
        let path = root.join(format!("{}-{}", prefix, Uuid::new_v4()));
        tokio::fs::create_dir_all(&path).await?;
        debug!(path = %path.display(), "Created scratch directory");
        Ok(Self { path, armed: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the directory to the caller; it will not be deleted.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }

    /// Delete the directory without blocking the runtime.
    ///
    /// The operation has already produced its result, so a failure is logged
    /// rather than returned.
    pub async fn close(mut self) {
        self.armed = false;
        log_removal(&self.path, tokio::fs::remove_dir_all(&self.path).await);
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.armed {
            log_removal(&self.path, std::fs::remove_dir_all(&self.path));
        }
    }
}

fn log_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => debug!(path = %path.display(), "Removed scratch directory"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {},
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove scratch directory"),
    }
}
