//! Duplicate image cleanup
//!
//! Files are grouped by their slugified base name, so `bat cat.jpeg` and
//! `bat-cat.png` are the same image. Within a group JPEG is kept over JPG,
//! and JPG over PNG. Between files of the same format, a name without
//! whitespace is kept.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::ports::outbound::{ArtifactStoragePort, StorageError};
use crate::domain::value_objects::{slugify, ImageFormat, StoredImage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub base_name: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupAction {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupPlan {
    pub duplicates: Vec<DuplicateGroup>,
    pub actions: Vec<CleanupAction>,
}

#[derive(Debug, Default)]
pub struct CleanupSummary {
    pub duplicate_sets: usize,
    pub planned: usize,
    pub removed: Vec<String>,
    pub errors: Vec<String>,
}

impl CleanupSummary {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("Cleanup Summary:\n");
        out.push_str(&format!("  Duplicate sets found: {}\n", self.duplicate_sets));
        out.push_str(&format!("  Actions planned: {}\n", self.planned));
        out.push_str(&format!("  Files removed: {}\n", self.removed.len()));
        out.push_str(&format!("  Errors encountered: {}\n", self.errors.len()));
        for error in &self.errors {
            out.push_str(&format!("    {}\n", error));
        }
        out
    }
}

fn is_cleanup_format(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Jpeg | ImageFormat::Jpg | ImageFormat::Png)
}

fn format_label(format: ImageFormat) -> String {
    format.extension().to_ascii_uppercase()
}

/// Names with nothing to slugify stay in a group of their own
fn group_key(basename: &str) -> String {
    let slug = slugify(basename);
    if slug.is_empty() {
        basename.to_string()
    } else {
        slug
    }
}

/// Work out which files to delete. Pure; nothing touches the disk.
pub fn plan_cleanup(images: &[StoredImage]) -> CleanupPlan {
    let mut groups: BTreeMap<String, Vec<&StoredImage>> = BTreeMap::new();
    for image in images.iter().filter(|image| is_cleanup_format(image.format)) {
        groups.entry(group_key(&image.basename)).or_default().push(image);
    }

    let mut plan = CleanupPlan::default();
    for (base_name, mut files) in groups {
        if files.len() < 2 {
            continue;
        }

        files.sort_by(|a, b| {
            b.format
                .preference_rank()
                .cmp(&a.format.preference_rank())
                .then_with(|| has_whitespace(&a.filename).cmp(&has_whitespace(&b.filename)))
                .then_with(|| a.filename.cmp(&b.filename))
        });

        let keep = files[0];
        for file in &files[1..] {
            let reason = if file.format == keep.format {
                "Duplicate with inferior naming removed".to_string()
            } else {
                format!(
                    "{} duplicate removed - {} preferred",
                    format_label(file.format),
                    format_label(keep.format)
                )
            };
            plan.actions.push(CleanupAction {
                file: file.filename.clone(),
                reason,
            });
        }

        plan.duplicates.push(DuplicateGroup {
            base_name,
            files: files.iter().map(|image| image.filename.clone()).collect(),
        });
    }

    plan
}

fn has_whitespace(name: &str) -> bool {
    name.chars().any(char::is_whitespace)
}

pub struct DuplicateCleanupService {
    storage: Arc<dyn ArtifactStoragePort>,
}

impl DuplicateCleanupService {
    pub fn new(storage: Arc<dyn ArtifactStoragePort>) -> Self {
        Self { storage }
    }

    pub async fn plan(&self) -> Result<CleanupPlan, StorageError> {
        let images = self.storage.scan_images().await?;
        let plan = plan_cleanup(&images);
        tracing::info!(
            "Found {} sets of duplicate files, planned {} cleanup actions",
            plan.duplicates.len(),
            plan.actions.len()
        );
        Ok(plan)
    }

    /// Execute a plan. A file that is already gone is not an error.
    pub async fn execute(&self, plan: &CleanupPlan, dry_run: bool) -> CleanupSummary {
        let mut summary = CleanupSummary {
            duplicate_sets: plan.duplicates.len(),
            planned: plan.actions.len(),
            ..CleanupSummary::default()
        };

        for action in &plan.actions {
            if dry_run {
                tracing::info!("[DRY RUN] Would remove {} ({})", action.file, action.reason);
                continue;
            }

            match self.storage.remove_image(&action.file).await {
                Ok(()) => {
                    tracing::info!("Removed {} ({})", action.file, action.reason);
                    summary.removed.push(action.file.clone());
                }
                Err(StorageError::NotFound(_)) => {
                    tracing::debug!("{} already gone", action.file);
                }
                Err(e) => {
                    tracing::error!("Failed to remove {}: {}", action.file, e);
                    summary
                        .errors
                        .push(format!("Failed to remove {}: {}", action.file, e));
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::LocalImageStorage;

    fn image(filename: &str) -> StoredImage {
        let (basename, ext) = filename.rsplit_once('.').expect("test names have extensions");
        StoredImage {
            filename: filename.to_string(),
            basename: basename.to_string(),
            format: ext.parse().expect("known format"),
            directory: "images".to_string(),
            size: 10,
            created: None,
            modified: None,
        }
    }

    #[test]
    fn test_plan_prefers_jpeg_then_jpg_then_png() {
        let plan = plan_cleanup(&[
            image("bat-cat.png"),
            image("bat-cat.jpeg"),
            image("bat-cat.jpg"),
            image("frog.jpg"),
            image("frog.png"),
            image("solo.png"),
            image("anim.gif"),
            image("anim.png"),
        ]);

        assert_eq!(plan.duplicates.len(), 2);
        assert_eq!(plan.duplicates[0].base_name, "bat-cat");
        assert_eq!(plan.duplicates[0].files[0], "bat-cat.jpeg");

        let removed: Vec<&str> = plan.actions.iter().map(|a| a.file.as_str()).collect();
        assert_eq!(removed, vec!["bat-cat.jpg", "bat-cat.png", "frog.png"]);
        assert_eq!(plan.actions[0].reason, "JPG duplicate removed - JPEG preferred");
        assert_eq!(plan.actions[2].reason, "PNG duplicate removed - JPG preferred");
    }

    #[test]
    fn test_whitespace_variant_of_a_name_is_the_same_image() {
        let plan = plan_cleanup(&[
            image("bat cat.jpeg"),
            image("bat-cat.jpeg"),
            image("bat-cat.png"),
            image("Owl Man.png"),
            image("owl-man.jpg"),
        ]);

        assert_eq!(plan.duplicates.len(), 2);
        assert_eq!(plan.duplicates[0].base_name, "bat-cat");
        assert_eq!(
            plan.duplicates[0].files,
            vec!["bat-cat.jpeg", "bat cat.jpeg", "bat-cat.png"]
        );
        assert_eq!(
            plan.actions[0],
            CleanupAction {
                file: "bat cat.jpeg".to_string(),
                reason: "Duplicate with inferior naming removed".to_string(),
            }
        );
        assert_eq!(plan.actions[1].file, "bat-cat.png");
        assert_eq!(plan.actions[1].reason, "PNG duplicate removed - JPEG preferred");

        assert_eq!(plan.duplicates[1].base_name, "owl-man");
        assert_eq!(plan.actions[2].file, "Owl Man.png");
        assert_eq!(plan.actions[2].reason, "PNG duplicate removed - JPG preferred");
    }

    #[test]
    fn test_unsluggable_names_are_not_merged() {
        let plan = plan_cleanup(&[image("!!!.png"), image("???.jpeg")]);
        assert!(plan.duplicates.is_empty());
    }

    #[test]
    fn test_plan_without_duplicates_is_empty() {
        let plan = plan_cleanup(&[image("a.png"), image("b.jpeg")]);
        assert_eq!(plan, CleanupPlan::default());
    }

    #[tokio::test]
    async fn test_execute_removes_planned_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).expect("create images dir");
        std::fs::write(images.join("owl.jpeg"), b"jpeg").expect("write");
        std::fs::write(images.join("owl.png"), b"png").expect("write");

        let storage = Arc::new(LocalImageStorage::new(&images, dir.path().join("debug")));
        let service = DuplicateCleanupService::new(storage);

        let plan = service.plan().await.expect("plan");
        let dry = service.execute(&plan, true).await;
        assert!(dry.removed.is_empty());
        assert!(images.join("owl.png").exists());

        let summary = service.execute(&plan, false).await;
        assert_eq!(summary.removed, vec!["owl.png".to_string()]);
        assert!(summary.errors.is_empty());
        assert!(images.join("owl.jpeg").exists());
        assert!(!images.join("owl.png").exists());

        let again = service.execute(&plan, false).await;
        assert!(again.removed.is_empty());
        assert!(again.errors.is_empty());
    }
}
