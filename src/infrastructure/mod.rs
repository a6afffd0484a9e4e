//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Vertex AI: image generation over HTTP
//! - gcloud: access tokens and the active account
//! - Storage: images and report artifacts on the local filesystem
//! - Persistence: the JSON roster document
//! - Audit: roster audit over image directories
//! - Config: Application configuration

pub mod audit;
pub mod config;
pub mod gcloud;
pub mod persistence;
pub mod storage;
pub mod vertex_ai;
