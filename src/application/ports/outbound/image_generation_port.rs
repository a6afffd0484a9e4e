//! Image generation port - one prompt in, one image out

use async_trait::async_trait;
use serde::Serialize;

use super::AuthError;
use crate::domain::value_objects::ImageFormat;

/// Parameters sent alongside every prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub width: u32,
    pub height: u32,
    pub guidance: f32,
    pub seed: u32,
    pub format: ImageFormat,
}

impl GenerationParams {
    /// Aspect ratio reduced to lowest terms, e.g. `"1:1"` for 512x512
    pub fn aspect_ratio(&self) -> String {
        fn gcd(a: u32, b: u32) -> u32 {
            if b == 0 {
                a
            } else {
                gcd(b, a % b)
            }
        }
        let divisor = gcd(self.width, self.height).max(1);
        format!("{}:{}", self.width / divisor, self.height / divisor)
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub params: GenerationParams,
}

/// Image bytes as delivered by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Base64 text, optionally prefixed with `data:image/<type>;base64,`
    Base64(String),
}

/// Problems with configuration or identity; these abort a run before any task
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigurationError {
    #[error("{0} is required")]
    MissingSetting(&'static str),
    #[error(
        "SECURITY ERROR: image generation must run as '{required}' but currently authenticated as '{active}'"
    )]
    IdentityMismatch { required: String, active: String },
    #[error("failed to verify identity: {0}")]
    IdentityCheck(AuthError),
    #[error("failed to obtain access token: {0}")]
    Token(AuthError),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("client used before its identity was verified")]
    NotValidated,
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("request failed: {0}")]
    Http(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("invalid response format: {0}")]
    InvalidResponse(String),
    #[error("no image data found in response")]
    NoImageData,
}

#[async_trait]
pub trait ImageGenerationPort: Send + Sync {
    /// Validate configuration and identity. Must succeed before `generate`.
    async fn validate(&self) -> Result<(), ConfigurationError>;

    /// One authenticated call, no retries
    async fn generate(&self, request: &GenerationRequest) -> Result<ImagePayload, GenerationError>;

    /// Parameters for the next request; the seed may differ per call
    fn params(&self) -> GenerationParams;
}
