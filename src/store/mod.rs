//! File persistence and retention for generated artifacts

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};

/// Extensions the retention sweep considers image artifacts
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// A persisted artifact
#[derive(Debug, Clone)]
pub struct SavedArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Filesystem store for generated images
pub struct ArtifactStore {
    images_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Create the images directory if absent; already existing is fine
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.images_dir).await?;
        Ok(())
    }

    /// Persist PNG bytes under `generated_<UTC timestamp>_<style>.png`
    pub async fn save_png(&self, data: &[u8], style: &str) -> Result<SavedArtifact> {
        self.ensure_dir()
            .await
            .map_err(|e| AppError::ArtifactWrite(e.to_string()))?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("generated_{timestamp}_{style}.png");
        let path = self.images_dir.join(&filename);

        fs::write(&path, data)
            .await
            .map_err(|e| AppError::ArtifactWrite(e.to_string()))?;

        debug!(path = ?path, size = data.len(), "Image saved");

        Ok(SavedArtifact {
            filename,
            path,
            size_bytes: data.len() as u64,
        })
    }

    /// Retention sweep: keep only the newest `max_images` artifacts by
    /// modification time. Individual delete failures are logged and skipped.
    pub async fn cleanup(&self, max_images: usize) -> Result<usize> {
        let mut files = match self.list_images().await {
            Ok(files) => files,
            Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        if files.len() <= max_images {
            debug!(count = files.len(), "No cleanup needed");
            return Ok(0);
        }

        files.sort_by_key(|(_, modified)| *modified);
        let excess = files.len() - max_images;

        let mut removed = 0;
        for (path, _) in files.into_iter().take(excess) {
            match fs::remove_file(&path).await {
                Ok(()) => {
                    removed += 1;
                    info!(path = ?path, "Removed old image");
                }
                Err(e) => warn!(path = ?path, error = %e, "Failed to remove old image"),
            }
        }

        info!(removed, "Image cleanup completed");
        Ok(removed)
    }

    async fn list_images(&self) -> Result<Vec<(PathBuf, SystemTime)>> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.images_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false);
            if !is_image {
                continue;
            }

            let modified = entry
                .metadata()
                .await?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((path, modified));
        }

        Ok(files)
    }
}
