//! Storage gateway port for generated artifacts and run reports

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use super::ImagePayload;
use crate::domain::value_objects::{StorageStats, StoredImage};

/// Filesystem failures, tagged by cause
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("disk full while writing {0}")]
    DiskFull(PathBuf),
    #[error("not found: {0}")]
    NotFound(PathBuf),
    #[error("invalid image payload: {0}")]
    InvalidPayload(String),
    #[error("invalid report: {0}")]
    InvalidReport(String),
    #[error("I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub file_path: PathBuf,
    pub relative_path: String,
    pub size: u64,
}

#[async_trait]
pub trait ArtifactStoragePort: Send + Sync {
    /// Create the output and report directories if missing
    async fn ensure_directories(&self) -> Result<(), StorageError>;

    async fn image_exists(&self, filename: &str) -> Result<bool, StorageError>;

    async fn save_image(
        &self,
        payload: &ImagePayload,
        filename: &str,
    ) -> Result<SavedImage, StorageError>;

    async fn remove_image(&self, filename: &str) -> Result<(), StorageError>;

    async fn scan_images(&self) -> Result<Vec<StoredImage>, StorageError>;

    async fn storage_stats(&self) -> Result<StorageStats, StorageError>;

    async fn save_report(
        &self,
        name: &str,
        report: &serde_json::Value,
    ) -> Result<PathBuf, StorageError>;

    async fn load_report(&self, name: &str) -> Result<Option<serde_json::Value>, StorageError>;

    /// Remove report files older than `max_age`; returns how many went
    async fn cleanup_old_reports(&self, max_age: Duration) -> Result<usize, StorageError>;
}
