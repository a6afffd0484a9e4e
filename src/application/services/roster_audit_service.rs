//! Roster audit - which heroes have images, which do not, and which files
//! belong to nobody

use std::collections::BTreeMap;

use crate::application::dto::{
    percent, AuditReport, AuditStats, DuplicateSet, FormatIssue, HeroImages, MissingHero,
    SlugCollision,
};
use crate::application::services::prompt_builder::theme_symbol;
use crate::domain::entities::HeroRecord;
use crate::domain::value_objects::{format_bytes, HeroSlug, ImageFormat, StoredImage};

/// An image belongs to a hero when its basename is the slug, or the slug
/// followed by a dot (`captain-canine.png.jpg`).
fn matches_slug(image: &StoredImage, slug: &HeroSlug) -> bool {
    let slug = slug.as_str();
    image.basename == slug
        || image
            .basename
            .strip_prefix(slug)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn format_issue(images: &[StoredImage]) -> FormatIssue {
    let has = |format: ImageFormat| images.iter().any(|image| image.format == format);
    let has_jpeg = has(ImageFormat::Jpeg);
    let has_jpg = has(ImageFormat::Jpg);
    let has_png = has(ImageFormat::Png);

    let recommended_action = match (has_jpeg, has_jpg, has_png) {
        (true, _, true) => "Remove PNG files",
        (true, true, false) => "Remove JPG files",
        (false, true, true) => "Remove PNG files",
        _ => "Review naming",
    };

    FormatIssue {
        has_jpeg,
        has_jpg,
        has_png,
        violates_jpeg_rule: has_jpeg && (has_png || has_jpg),
        recommended_action,
    }
}

/// Heroes sharing a valid slug, grouped in slug order
fn slug_collisions(heroes: &[HeroRecord]) -> Vec<SlugCollision> {
    let mut by_slug: BTreeMap<HeroSlug, Vec<String>> = BTreeMap::new();
    for hero in heroes {
        let slug = hero.slug();
        if slug.is_valid() {
            by_slug.entry(slug).or_default().push(hero.name.clone());
        }
    }

    by_slug
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(slug, hero_names)| {
            tracing::warn!(
                "Heroes {} all map to slug '{}' and would share one image file",
                hero_names.join(", "),
                slug
            );
            SlugCollision { slug, hero_names }
        })
        .collect()
}

/// Match every hero against the scanned images
pub fn audit_roster(heroes: &[HeroRecord], images: &[StoredImage]) -> AuditReport {
    let mut report = AuditReport {
        slug_collisions: slug_collisions(heroes),
        ..AuditReport::default()
    };
    let mut matched = vec![false; images.len()];

    for hero in heroes {
        let slug = hero.slug();
        if !slug.is_valid() {
            tracing::warn!("Hero '{}' has no usable slug", hero.name);
        }

        let mut hero_images = Vec::new();
        for (index, image) in images.iter().enumerate() {
            if matches_slug(image, &slug) {
                matched[index] = true;
                hero_images.push(image.clone());
            }
        }

        if hero_images.is_empty() {
            report.heroes_without_images.push(MissingHero {
                hero: hero.clone(),
                slug,
            });
            continue;
        }

        if hero_images.len() > 1 {
            report.duplicate_images.push(DuplicateSet {
                hero_name: hero.name.clone(),
                slug: slug.clone(),
                format_issue: format_issue(&hero_images),
                images: hero_images.clone(),
            });
        }

        report.heroes_with_images.push(HeroImages {
            hero: hero.clone(),
            slug,
            images: hero_images,
        });
    }

    report.orphaned_images = images
        .iter()
        .zip(matched)
        .filter(|(_, matched)| !matched)
        .map(|(image, _)| image.clone())
        .collect();

    report.stats = AuditStats {
        total_heroes: heroes.len(),
        total_images: images.len(),
        heroes_with_images: report.heroes_with_images.len(),
        heroes_without_images: report.heroes_without_images.len(),
        orphaned_images: report.orphaned_images.len(),
        duplicate_images: report.duplicate_images.len(),
        slug_collisions: report.slug_collisions.len(),
    };

    report
}

/// Console rendering of an audit
pub fn render_audit_report(report: &AuditReport) -> String {
    let stats = &report.stats;
    let mut out = String::new();

    out.push_str("AUDIT RESULTS\n================\n");
    out.push_str(&format!("Total Heroes: {}\n", stats.total_heroes));
    out.push_str(&format!("Total Images: {}\n", stats.total_images));
    out.push_str(&format!(
        "Heroes with Images: {} ({}%)\n",
        stats.heroes_with_images,
        stats.coverage()
    ));
    out.push_str(&format!(
        "Heroes without Images: {} ({}%)\n",
        stats.heroes_without_images,
        percent(stats.heroes_without_images, stats.total_heroes)
    ));
    out.push_str(&format!("Orphaned Images: {}\n", stats.orphaned_images));
    out.push_str(&format!("Duplicate Images: {}\n", stats.duplicate_images));
    if stats.slug_collisions > 0 {
        out.push_str(&format!("Slug Collisions: {}\n", stats.slug_collisions));
    }

    if !report.heroes_with_images.is_empty() {
        out.push_str("\nHEROES WITH IMAGES\n");
        for item in &report.heroes_with_images {
            let files: Vec<String> = item
                .images
                .iter()
                .map(|image| format!("{} ({})", image.filename, image.directory))
                .collect();
            out.push_str(&format!("  {} ({})\n    -> {}\n", item.hero.name, item.slug, files.join(", ")));
        }
    }

    if !report.heroes_without_images.is_empty() {
        out.push_str("\nHEROES WITHOUT IMAGES\n");
        for item in &report.heroes_without_images {
            out.push_str(&format!(
                "  {} ({})\n    -> Using emoji fallback: {}\n",
                item.hero.name,
                item.slug,
                theme_symbol(&item.hero.theme)
            ));
        }
    }

    if !report.orphaned_images.is_empty() {
        out.push_str("\nORPHANED IMAGES\nImages with no corresponding hero entries:\n");
        for image in &report.orphaned_images {
            out.push_str(&format!(
                "  {} ({}) - {}\n",
                image.filename,
                image.directory,
                format_bytes(image.size)
            ));
        }
    }

    if !report.duplicate_images.is_empty() {
        out.push_str("\nDUPLICATE IMAGES & FORMAT ISSUES\n");
        for item in &report.duplicate_images {
            out.push_str(&format!("  {} ({})\n", item.hero_name, item.slug));
            let issue = &item.format_issue;
            for image in &item.images {
                let mark = match image.format {
                    _ if !issue.violates_jpeg_rule => "",
                    ImageFormat::Jpeg => " KEEP",
                    ImageFormat::Png | ImageFormat::Jpg => " REMOVE",
                    _ => "",
                };
                out.push_str(&format!("    -> {} ({}){}\n", image.filename, image.directory, mark));
            }
            if issue.violates_jpeg_rule {
                out.push_str(&format!("    Action: {}\n", issue.recommended_action));
            }
        }
    }

    if !report.slug_collisions.is_empty() {
        out.push_str("\nSLUG COLLISIONS\nHeroes that map to the same image file:\n");
        for collision in &report.slug_collisions {
            out.push_str(&format!(
                "  {} <- {}\n",
                collision.slug,
                collision.hero_names.join(", ")
            ));
        }
    }

    out.push_str("\nRECOMMENDATIONS\n");
    if stats.heroes_without_images > 0 {
        out.push_str(&format!(
            "- Create images for {} heroes missing images\n",
            stats.heroes_without_images
        ));
    }
    if stats.orphaned_images > 0 {
        out.push_str(&format!(
            "- Review {} orphaned images - delete unused or rename to match heroes\n",
            stats.orphaned_images
        ));
    }
    if stats.duplicate_images > 0 {
        let violations = report
            .duplicate_images
            .iter()
            .filter(|item| item.format_issue.violates_jpeg_rule)
            .count();
        out.push_str(&format!(
            "- Resolve {} heroes with multiple images - choose primary image\n",
            stats.duplicate_images
        ));
        if violations > 0 {
            out.push_str(&format!(
                "- Fix {} JPEG preference rule violations - run the cleanup command\n",
                violations
            ));
        }
    }
    if stats.slug_collisions > 0 {
        out.push_str(&format!(
            "- Rename heroes in {} slug collisions - only one of each group can get an image\n",
            stats.slug_collisions
        ));
    }
    if stats.heroes_with_images == stats.total_heroes && stats.orphaned_images == 0 {
        out.push_str("All heroes have images and no orphaned files exist.\n");
    }

    out
}
