//! Image files found on disk

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ImageFormat;

/// An image file discovered by scanning a directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredImage {
    pub filename: String,
    /// File name without its extension
    pub basename: String,
    pub format: ImageFormat,
    /// Name of the directory the file was found in
    pub directory: String,
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

/// Aggregate disk usage of a set of images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub count: usize,
    pub total_bytes: u64,
    pub average_bytes: u64,
}

impl StorageStats {
    pub fn from_images(images: &[StoredImage]) -> Self {
        let total_bytes: u64 = images.iter().map(|image| image.size).sum();
        let count = images.len();
        let average_bytes = if count > 0 {
            (total_bytes as f64 / count as f64).round() as u64
        } else {
            0
        };
        Self {
            count,
            total_bytes,
            average_bytes,
        }
    }

    pub fn total_formatted(&self) -> String {
        format_bytes(self.total_bytes)
    }
}

/// Human readable size in base-1024 units, one decimal, e.g. `1.5 KB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[unit])
    } else {
        format!("{:.1} {}", rounded, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(size: u64) -> StoredImage {
        StoredImage {
            filename: "a.png".into(),
            basename: "a".into(),
            format: ImageFormat::Png,
            directory: "images".into(),
            size,
            created: None,
            modified: None,
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn test_storage_stats() {
        let stats = StorageStats::from_images(&[image(100), image(201)]);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total_bytes, 301);
        assert_eq!(stats.average_bytes, 151);
        assert_eq!(StorageStats::from_images(&[]).average_bytes, 0);
    }
}
