//! Backing file access
//!
//! The store only ever reads the whole file once at startup and replaces the
//! whole file after each mutation, so the backend contract is two calls.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

/// Where the snapshot lives
#[async_trait]
pub trait Backend: Send + Sync {
    /// Read the full snapshot. `Ok(None)` when nothing has been written yet.
    async fn read(&self) -> io::Result<Option<Vec<u8>>>;

    /// Replace the full snapshot
    async fn write(&self, bytes: &[u8]) -> io::Result<()>;

    /// Human readable location, for logs
    fn describe(&self) -> String;
}

/// Snapshot stored in a single file on the local filesystem
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Backend for FileBackend {
    async fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Write beside the target, then swap it in
        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
