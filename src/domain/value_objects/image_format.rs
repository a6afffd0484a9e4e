//! Image file formats understood by the pipeline

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A raster or vector image format, identified by its file extension
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
    Jpeg,
    Webp,
    Gif,
    Svg,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 6] = [
        Self::Png,
        Self::Jpg,
        Self::Jpeg,
        Self::Webp,
        Self::Gif,
        Self::Svg,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Svg => "svg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg | Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Svg => "image/svg+xml",
        }
    }

    /// Rank used when several formats of the same image exist.
    /// JPEG beats JPG beats PNG; everything else is never preferred.
    pub fn preference_rank(&self) -> u8 {
        match self {
            Self::Jpeg => 3,
            Self::Jpg => 2,
            Self::Png => 1,
            _ => 0,
        }
    }

    /// Format of a file name, judged by its extension (case-insensitive)
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        ext.parse().ok()
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported image format: {0}")]
pub struct UnknownImageFormat(pub String);

impl FromStr for ImageFormat {
    type Err = UnknownImageFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extension() == lower)
            .ok_or_else(|| UnknownImageFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("PNG".parse::<ImageFormat>(), Ok(ImageFormat::Png));
        assert_eq!(" jpeg ".parse::<ImageFormat>(), Ok(ImageFormat::Jpeg));
        assert!("tiff".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn test_from_filename() {
        assert_eq!(ImageFormat::from_filename("captain-bulldog.JPG"), Some(ImageFormat::Jpg));
        assert_eq!(ImageFormat::from_filename("captain-canine.png.jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_filename("notes.txt"), None);
        assert_eq!(ImageFormat::from_filename("README"), None);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(ImageFormat::Png.mime_type(), "image/png");
        assert_eq!(ImageFormat::Jpg.mime_type(), ImageFormat::Jpeg.mime_type());
        assert_eq!(ImageFormat::Svg.mime_type(), "image/svg+xml");
        assert!(ImageFormat::ALL
            .iter()
            .all(|format| format.mime_type().starts_with("image/")));
    }

    #[test]
    fn test_preference_order() {
        assert!(ImageFormat::Jpeg.preference_rank() > ImageFormat::Jpg.preference_rank());
        assert!(ImageFormat::Jpg.preference_rank() > ImageFormat::Png.preference_rank());
        assert!(ImageFormat::Png.preference_rank() > ImageFormat::Webp.preference_rank());
    }
}
