//! Local filesystem storage for generated images and run reports

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};

use crate::application::ports::outbound::{
    ArtifactStoragePort, ImagePayload, SavedImage, StorageError,
};
use crate::domain::value_objects::{
    format_bytes, slug_from_filename, ImageFormat, StorageStats, StoredImage, IMAGE_PATH_PREFIX,
};

fn io_error(path: &Path, e: io::Error) -> StorageError {
    let path = path.to_path_buf();
    match e.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound(path),
        io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(path),
        io::ErrorKind::StorageFull => StorageError::DiskFull(path),
        _ => StorageError::Io {
            path,
            message: e.to_string(),
        },
    }
}

/// Accepts plain base64 or a `data:image/<type>;base64,` URL
fn decode_payload(payload: &ImagePayload) -> Result<Vec<u8>, StorageError> {
    let ImagePayload::Base64(text) = payload;
    let text = text.trim();
    let data = match text.strip_prefix("data:image/") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .ok_or_else(|| StorageError::InvalidPayload("malformed data URL".to_string()))?,
        None => text,
    };
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| StorageError::InvalidPayload(e.to_string()))?;

    if bytes.is_empty() {
        return Err(StorageError::InvalidPayload("empty image data".to_string()));
    }
    Ok(bytes)
}

fn to_utc(time: io::Result<SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

/// List image files (supported extensions only) in a directory.
/// A missing directory yields an empty list.
pub async fn scan_directory(dir: &Path) -> Result<Vec<StoredImage>, StorageError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("Directory not found: {}", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(io_error(dir, e)),
    };

    let directory = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut images = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(dir, e))? {
        let filename = entry.file_name().to_string_lossy().into_owned();
        let Some(format) = ImageFormat::from_filename(&filename) else {
            continue;
        };
        let metadata = entry
            .metadata()
            .await
            .map_err(|e| io_error(&entry.path(), e))?;
        if !metadata.is_file() {
            continue;
        }

        let basename = slug_from_filename(&filename).to_string();
        images.push(StoredImage {
            basename,
            format,
            directory: directory.clone(),
            size: metadata.len(),
            created: to_utc(metadata.created()),
            modified: to_utc(metadata.modified()),
            filename,
        });
    }

    images.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(images)
}

/// Images in `output_dir`, reports in `debug_dir`
pub struct LocalImageStorage {
    output_dir: PathBuf,
    debug_dir: PathBuf,
}

impl LocalImageStorage {
    pub fn new(output_dir: impl Into<PathBuf>, debug_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            debug_dir: debug_dir.into(),
        }
    }

    async fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
        if tokio::fs::try_exists(dir).await.map_err(|e| io_error(dir, e))? {
            return Ok(());
        }
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| io_error(dir, e))?;
        tracing::info!("Created directory: {}", dir.display());
        Ok(())
    }
}

#[async_trait]
impl ArtifactStoragePort for LocalImageStorage {
    async fn ensure_directories(&self) -> Result<(), StorageError> {
        Self::ensure_dir(&self.output_dir).await?;
        Self::ensure_dir(&self.debug_dir).await
    }

    async fn image_exists(&self, filename: &str) -> Result<bool, StorageError> {
        let path = self.output_dir.join(filename);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_error(&path, e))
    }

    async fn save_image(
        &self,
        payload: &ImagePayload,
        filename: &str,
    ) -> Result<SavedImage, StorageError> {
        let bytes = decode_payload(payload)?;
        Self::ensure_dir(&self.output_dir).await?;

        let file_path = self.output_dir.join(filename);
        tokio::fs::write(&file_path, &bytes)
            .await
            .map_err(|e| io_error(&file_path, e))?;
        let size = tokio::fs::metadata(&file_path)
            .await
            .map_err(|e| io_error(&file_path, e))?
            .len();

        tracing::info!("Saved image: {} ({})", filename, format_bytes(size));
        Ok(SavedImage {
            relative_path: format!("{}/{}", IMAGE_PATH_PREFIX, filename),
            file_path,
            size,
        })
    }

    async fn remove_image(&self, filename: &str) -> Result<(), StorageError> {
        let path = self.output_dir.join(filename);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| io_error(&path, e))
    }

    async fn scan_images(&self) -> Result<Vec<StoredImage>, StorageError> {
        scan_directory(&self.output_dir).await
    }

    async fn storage_stats(&self) -> Result<StorageStats, StorageError> {
        let images = self.scan_images().await?;
        Ok(StorageStats::from_images(&images))
    }

    async fn save_report(
        &self,
        name: &str,
        report: &serde_json::Value,
    ) -> Result<PathBuf, StorageError> {
        Self::ensure_dir(&self.debug_dir).await?;
        let path = self.debug_dir.join(name);
        let body = serde_json::to_vec_pretty(report)
            .map_err(|e| StorageError::InvalidReport(e.to_string()))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| io_error(&path, e))?;
        Ok(path)
    }

    async fn load_report(&self, name: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let path = self.debug_dir.join(name);
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| StorageError::InvalidReport(e.to_string()))
    }

    async fn cleanup_old_reports(&self, max_age: Duration) -> Result<usize, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.debug_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(io_error(&self.debug_dir, e)),
        };

        let now = SystemTime::now();
        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.debug_dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let modified = entry
                .metadata()
                .await
                .and_then(|metadata| metadata.modified())
                .map_err(|e| io_error(&path, e))?;
            let age = now.duration_since(modified).unwrap_or_default();
            if age > max_age {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| io_error(&path, e))?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn storage() -> (tempfile::TempDir, LocalImageStorage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = LocalImageStorage::new(dir.path().join("images"), dir.path().join("debug"));
        (dir, storage)
    }

    #[tokio::test]
    async fn test_ensure_directories_is_idempotent() {
        let (dir, storage) = storage();
        storage.ensure_directories().await.expect("first call");
        storage.ensure_directories().await.expect("second call");
        assert!(dir.path().join("images").is_dir());
        assert!(dir.path().join("debug").is_dir());
    }

    #[tokio::test]
    async fn test_save_base64_and_data_url_payloads() {
        let (dir, storage) = storage();

        let saved = storage
            .save_image(&ImagePayload::Base64("aGVsbG8=".to_string()), "bee-boy.png")
            .await
            .expect("save base64");
        assert_eq!(saved.size, 5);
        assert_eq!(saved.relative_path, "./images/bee-boy.png");
        assert!(storage.image_exists("bee-boy.png").await.expect("exists"));

        storage
            .save_image(
                &ImagePayload::Base64("data:image/png;base64,aGVsbG8=".to_string()),
                "frog-man.png",
            )
            .await
            .expect("save data url");
        assert_eq!(
            std::fs::read(dir.path().join("images/frog-man.png")).expect("read"),
            b"hello"
        );

        let saved = storage
            .save_image(&ImagePayload::Base64("  AQID\n".to_string()), "bat-cat.png")
            .await
            .expect("save padded base64");
        assert_eq!(saved.size, 3);
        assert!(!storage.image_exists("missing.png").await.expect("exists"));
    }

    #[tokio::test]
    async fn test_invalid_payloads_are_rejected() {
        let (_dir, storage) = storage();
        let bad = storage
            .save_image(&ImagePayload::Base64("not base64!".to_string()), "x.png")
            .await;
        assert!(matches!(bad, Err(StorageError::InvalidPayload(_))));

        let empty = storage
            .save_image(&ImagePayload::Base64(String::new()), "x.png")
            .await;
        assert!(matches!(empty, Err(StorageError::InvalidPayload(_))));

        let empty = storage
            .save_image(&ImagePayload::Base64("data:image/png;base64,".to_string()), "x.png")
            .await;
        assert!(matches!(empty, Err(StorageError::InvalidPayload(_))));
        assert!(!storage.image_exists("x.png").await.expect("exists"));
    }

    #[tokio::test]
    async fn test_write_below_a_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not a directory").expect("write");
        let storage = LocalImageStorage::new(blocker.join("images"), dir.path().join("debug"));

        let result = storage
            .save_image(&ImagePayload::Base64("AQ==".to_string()), "x.png")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_scan_and_stats() {
        let (dir, storage) = storage();
        assert!(storage.scan_images().await.expect("scan missing dir").is_empty());

        let images = dir.path().join("images");
        std::fs::create_dir_all(images.join("nested.png")).expect("dir named like an image");
        std::fs::write(images.join("b.png"), vec![0u8; 300]).expect("write");
        std::fs::write(images.join("a.jpeg"), vec![0u8; 100]).expect("write");
        std::fs::write(images.join("notes.txt"), b"ignored").expect("write");

        let scanned = storage.scan_images().await.expect("scan");
        let names: Vec<&str> = scanned.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["a.jpeg", "b.png"]);
        assert_eq!(scanned[0].basename, "a");
        assert_eq!(scanned[0].directory, "images");
        assert!(scanned[0].modified.is_some());

        let stats = storage.storage_stats().await.expect("stats");
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total_bytes, 400);
        assert_eq!(stats.average_bytes, 200);
    }

    #[tokio::test]
    async fn test_report_round_trip() {
        let (_dir, storage) = storage();
        assert!(storage.load_report("run.json").await.expect("load").is_none());

        let path = storage
            .save_report("run.json", &json!({"generated": 3}))
            .await
            .expect("save report");
        assert!(path.ends_with("run.json"));

        let loaded = storage.load_report("run.json").await.expect("load");
        assert_eq!(loaded, Some(json!({"generated": 3})));
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_old_json_reports() {
        let (dir, storage) = storage();
        storage.save_report("old.json", &json!({})).await.expect("save");
        storage.save_report("fresh.json", &json!({})).await.expect("save");
        let debug = dir.path().join("debug");
        std::fs::write(debug.join("old.txt"), b"keep").expect("write");

        let eight_days = Duration::from_secs(8 * 24 * 3600);
        for name in ["old.json", "old.txt"] {
            std::fs::File::options()
                .write(true)
                .open(debug.join(name))
                .expect("open")
                .set_modified(SystemTime::now() - eight_days)
                .expect("set mtime");
        }

        let removed = storage
            .cleanup_old_reports(Duration::from_secs(7 * 24 * 3600))
            .await
            .expect("cleanup");
        assert_eq!(removed, 1);
        assert!(!debug.join("old.json").exists());
        assert!(debug.join("fresh.json").exists());
        assert!(debug.join("old.txt").exists());
    }

    #[tokio::test]
    async fn test_remove_missing_image_is_not_found() {
        let (_dir, storage) = storage();
        let result = storage.remove_image("ghost.png").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
