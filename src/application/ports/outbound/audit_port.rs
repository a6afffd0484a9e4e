use async_trait::async_trait;

use super::StorageError;
use crate::application::dto::AuditReport;
use crate::domain::entities::HeroRecord;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to scan images: {0}")]
    Scan(#[from] StorageError),
}

/// Compares the roster against the images that exist on disk
#[async_trait]
pub trait RosterAuditPort: Send + Sync {
    async fn audit(&self, heroes: &[HeroRecord]) -> Result<AuditReport, AuditError>;
}
