//! Roster audit over image directories on disk

use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::dto::AuditReport;
use crate::application::ports::outbound::{AuditError, RosterAuditPort};
use crate::application::services::roster_audit_service::audit_roster;
use crate::domain::entities::HeroRecord;
use crate::infrastructure::storage::scan_directory;

pub struct DirectoryRosterAudit {
    image_dirs: Vec<PathBuf>,
}

impl DirectoryRosterAudit {
    pub fn new(image_dirs: Vec<PathBuf>) -> Self {
        Self { image_dirs }
    }
}

#[async_trait]
impl RosterAuditPort for DirectoryRosterAudit {
    async fn audit(&self, heroes: &[HeroRecord]) -> Result<AuditReport, AuditError> {
        let mut images = Vec::new();
        for dir in &self.image_dirs {
            let found = scan_directory(dir).await?;
            tracing::debug!("Found {} images in {}", found.len(), dir.display());
            images.extend(found);
        }

        Ok(audit_roster(heroes, &images))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_audit_spans_all_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let public = dir.path().join("images");
        let legacy = dir.path().join("legacy");
        std::fs::create_dir_all(&public).expect("mkdir");
        std::fs::create_dir_all(&legacy).expect("mkdir");
        std::fs::write(public.join("bee-boy.png"), b"png").expect("write");
        std::fs::write(legacy.join("bee-boy.jpeg"), b"jpeg").expect("write");

        let audit = DirectoryRosterAudit::new(vec![
            public,
            legacy,
            dir.path().join("missing"),
        ]);
        let heroes = vec![HeroRecord::new("Bee Boy"), HeroRecord::new("Frog Man")];
        let report = audit.audit(&heroes).await.expect("audit");

        assert_eq!(report.stats.total_images, 2);
        assert_eq!(report.stats.heroes_with_images, 1);
        assert_eq!(report.stats.duplicate_images, 1);
        assert_eq!(report.heroes_without_images[0].hero.name, "Frog Man");
        let directories: Vec<&str> = report.heroes_with_images[0]
            .images
            .iter()
            .map(|image| image.directory.as_str())
            .collect();
        assert_eq!(directories, vec!["images", "legacy"]);
    }
}
