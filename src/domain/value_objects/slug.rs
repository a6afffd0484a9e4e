//! Hero slugs - the join key between roster entries and image files
//!
//! A slug is derived from a hero's display name: lowercase, only `[a-z0-9-]`,
//! words joined by single hyphens, no leading or trailing hyphen. Names that
//! differ only in case or punctuation map to the same slug, and therefore to
//! the same image file.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ImageFormat;

/// Public path prefix under which the game serves hero images
pub const IMAGE_PATH_PREFIX: &str = "./images";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeroSlug(String);

impl HeroSlug {
    /// Derive the slug for a display name
    pub fn from_name(name: &str) -> Self {
        Self(slugify(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `{slug}.{extension}`
    pub fn filename(&self, format: ImageFormat) -> String {
        format!("{}.{}", self.0, format.extension())
    }

    /// Path relative to the public directory, as stored in the roster
    pub fn image_path(&self, format: ImageFormat) -> String {
        format!("{}/{}", IMAGE_PATH_PREFIX, self.filename(format))
    }

    /// The file name in every supported format, in `ImageFormat::ALL` order
    pub fn filename_variations(&self) -> Vec<String> {
        ImageFormat::ALL
            .iter()
            .map(|format| self.filename(*format))
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        is_valid_slug(&self.0)
    }
}

impl fmt::Display for HeroSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a display name into a filesystem-safe token.
///
/// Characters outside `[a-z0-9]`, whitespace and `-` are dropped after
/// lowercasing; whitespace runs become a hyphen; hyphen runs collapse;
/// leading and trailing hyphens are trimmed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c == '-' || c.is_whitespace() {
            pending_hyphen = true;
        }
    }

    slug
}

/// `^[a-z0-9]+(-[a-z0-9]+)*$`
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Strip a supported image extension from a file name
pub fn slug_from_filename(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) if ImageFormat::from_filename(filename).is_some() => stem,
        _ => filename,
    }
}
