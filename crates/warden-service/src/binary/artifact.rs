//! Local-disk storage for wrapped binary artifacts.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use warden_core::{AppError, AppResult};

/// Stores wrapped artifacts under a configured data root.
///
/// Paths are always single flat file names generated by the service,
/// never client input, so no traversal handling is needed beyond the
/// sanity check in `resolve`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Ensure the root directory exists.
    pub async fn init(&self) -> AppResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Write an artifact, creating or replacing the file.
    pub async fn write(&self, name: &str, data: &[u8]) -> AppResult<()> {
        let path = self.resolve(name)?;
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        debug!(path = %path.display(), bytes = data.len(), "Artifact written");
        Ok(())
    }

    /// Open an artifact for streaming.
    pub async fn open(&self, name: &str) -> AppResult<fs::File> {
        let path = self.resolve(name)?;
        fs::File::open(&path)
            .await
            .map_err(|e| AppError::storage(format!("Artifact '{name}' unreadable: {e}")))
    }

    /// Remove an artifact if present.
    pub async fn remove(&self, name: &str) -> AppResult<()> {
        let path = self.resolve(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, name: &str) -> AppResult<PathBuf> {
        if name.is_empty() || Path::new(name).components().count() != 1 {
            return Err(AppError::storage(format!("Invalid artifact name '{name}'")));
        }
        Ok(self.root.join(name))
    }
}
