//! Roster audit results
//!
//! Serialized with camelCase keys so the debug page can read the saved
//! `image-audit.json` directly.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::entities::HeroRecord;
use crate::domain::value_objects::{HeroSlug, StoredImage};

#[derive(Debug, Clone)]
pub struct HeroImages {
    pub hero: HeroRecord,
    pub slug: HeroSlug,
    pub images: Vec<StoredImage>,
}

#[derive(Debug, Clone)]
pub struct MissingHero {
    pub hero: HeroRecord,
    pub slug: HeroSlug,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatIssue {
    pub has_jpeg: bool,
    pub has_jpg: bool,
    pub has_png: bool,
    pub violates_jpeg_rule: bool,
    pub recommended_action: &'static str,
}

#[derive(Debug, Clone)]
pub struct DuplicateSet {
    pub hero_name: String,
    pub slug: HeroSlug,
    pub images: Vec<StoredImage>,
    pub format_issue: FormatIssue,
}

/// Several heroes whose names reduce to the same slug, and so to the same
/// image file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugCollision {
    pub slug: HeroSlug,
    pub hero_names: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total_heroes: usize,
    pub total_images: usize,
    pub heroes_with_images: usize,
    pub heroes_without_images: usize,
    pub orphaned_images: usize,
    pub duplicate_images: usize,
    pub slug_collisions: usize,
}

impl AuditStats {
    /// Share of heroes with at least one image, rounded percent
    pub fn coverage(&self) -> u32 {
        percent(self.heroes_with_images, self.total_heroes)
    }

    pub fn has_issues(&self) -> bool {
        self.heroes_without_images > 0 || self.orphaned_images > 0 || self.slug_collisions > 0
    }
}

pub(crate) fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        0
    } else {
        ((part as f64 / whole as f64) * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub heroes_with_images: Vec<HeroImages>,
    pub heroes_without_images: Vec<MissingHero>,
    pub orphaned_images: Vec<StoredImage>,
    pub duplicate_images: Vec<DuplicateSet>,
    pub slug_collisions: Vec<SlugCollision>,
    pub stats: AuditStats,
}

fn image_json(image: &StoredImage) -> Value {
    json!({
        "filename": image.filename,
        "directory": image.directory,
        "size": image.size,
        "mimeType": image.format.mime_type(),
    })
}

impl AuditReport {
    pub fn to_json(&self) -> Value {
        json!({
            "timestamp": Utc::now().to_rfc3339(),
            "stats": self.stats,
            "heroesWithImages": self.heroes_with_images.iter().map(|item| json!({
                "heroName": item.hero.name,
                "slug": item.slug,
                "images": item.images.iter().map(image_json).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
            "heroesWithoutImages": self.heroes_without_images.iter().map(|item| json!({
                "heroName": item.hero.name,
                "slug": item.slug,
                "animalTheme": item.hero.theme,
                "expectedFilenames": item.slug.filename_variations(),
            })).collect::<Vec<_>>(),
            "orphanedImages": self.orphaned_images.iter().map(image_json).collect::<Vec<_>>(),
            "duplicateImages": self.duplicate_images.iter().map(|item| json!({
                "heroName": item.hero_name,
                "slug": item.slug,
                "images": item.images.iter().map(image_json).collect::<Vec<_>>(),
                "formatIssue": item.format_issue,
            })).collect::<Vec<_>>(),
            "slugCollisions": self.slug_collisions,
        })
    }
}
