use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::ports::outbound::{RosterError, RosterRepositoryPort};
use crate::domain::entities::Roster;

/// Roster stored as one JSON document on disk
pub struct JsonRosterRepository {
    path: PathBuf,
}

impl JsonRosterRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `heroes.json` -> `heroes.backup.json`
    pub fn backup_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "roster".to_string());
        self.path.with_file_name(format!("{}.backup.json", stem))
    }

    fn io_error(&self, e: io::Error) -> RosterError {
        match e.kind() {
            io::ErrorKind::NotFound => RosterError::NotFound(self.path.display().to_string()),
            _ => RosterError::Io(format!("{}: {}", self.path.display(), e)),
        }
    }
}

#[async_trait]
impl RosterRepositoryPort for JsonRosterRepository {
    async fn load(&self) -> Result<Roster, RosterError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        let roster: Roster = serde_json::from_str(&body)
            .map_err(|e| RosterError::Invalid(format!("{}: {}", self.path.display(), e)))?;
        tracing::info!("Loaded {} heroes from {}", roster.len(), self.path.display());
        Ok(roster)
    }

    async fn save(&self, roster: &Roster) -> Result<(), RosterError> {
        let body = serde_json::to_string_pretty(roster)
            .map_err(|e| RosterError::Invalid(e.to_string()))?;

        // Keep the previous document next to the new one
        match tokio::fs::copy(&self.path, self.backup_path()).await {
            Ok(_) => tracing::debug!("Backed up roster to {}", self.backup_path().display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.io_error(e)),
        }

        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| self.io_error(e))?;
        tracing::info!("Saved {} heroes to {}", roster.len(), self.path.display());
        Ok(())
    }
}
