//! Outbound ports - Interfaces the pipeline requires from external systems

mod audit_port;
mod credential_port;
mod image_generation_port;
mod roster_port;
mod storage_port;

pub use audit_port::{AuditError, RosterAuditPort};
pub use credential_port::{AccessToken, AuthError, CredentialProvider, IdentityProvider};
pub use image_generation_port::{
    ConfigurationError, GenerationError, GenerationParams, GenerationRequest, ImageGenerationPort,
    ImagePayload,
};
pub use roster_port::{RosterError, RosterRepositoryPort};
pub use storage_port::{ArtifactStoragePort, SavedImage, StorageError};
