use async_trait::async_trait;

use crate::domain::entities::Roster;

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("roster not found: {0}")]
    NotFound(String),
    #[error("invalid roster document: {0}")]
    Invalid(String),
    #[error("roster I/O error: {0}")]
    Io(String),
}

/// Whole-document access to the hero roster. Last writer wins.
#[async_trait]
pub trait RosterRepositoryPort: Send + Sync {
    async fn load(&self) -> Result<Roster, RosterError>;
    async fn save(&self, roster: &Roster) -> Result<(), RosterError>;
}
