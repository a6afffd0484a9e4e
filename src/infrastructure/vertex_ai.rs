//! Vertex AI client for hero portrait generation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::{
    ConfigurationError, CredentialProvider, GenerationError, GenerationParams, GenerationRequest,
    IdentityProvider, ImageGenerationPort, ImagePayload,
};
use crate::domain::value_objects::ImageFormat;
use crate::infrastructure::config::{ImageSettings, VertexConfig};

/// Client for the Vertex AI `:predict` endpoint.
///
/// Refuses to generate until [`ImageGenerationPort::validate`] has confirmed
/// the active identity.
pub struct VertexAiClient {
    client: Client,
    config: VertexConfig,
    image: ImageSettings,
    credentials: Arc<dyn CredentialProvider>,
    identity: Arc<dyn IdentityProvider>,
    validated: AtomicBool,
}

impl VertexAiClient {
    pub fn new(
        config: VertexConfig,
        image: ImageSettings,
        credentials: Arc<dyn CredentialProvider>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            config,
            image,
            credentials,
            identity,
            validated: AtomicBool::new(false),
        })
    }

    fn map_request_error(&self, error: reqwest::Error) -> GenerationError {
        if error.is_timeout() {
            GenerationError::Timeout(self.config.request_timeout.as_secs())
        } else {
            GenerationError::Http(error.to_string())
        }
    }
}

#[async_trait]
impl ImageGenerationPort for VertexAiClient {
    async fn validate(&self) -> Result<(), ConfigurationError> {
        let endpoint = self
            .config
            .endpoint()
            .ok_or(ConfigurationError::MissingSetting("GOOGLE_CLOUD_PROJECT"))?;
        let required = self
            .config
            .required_account
            .as_deref()
            .ok_or(ConfigurationError::MissingSetting("REQUIRED_GCLOUD_ACCOUNT"))?;

        tracing::info!(
            "Vertex AI: project={:?} location={} model={}",
            self.config.project,
            self.config.location,
            self.config.model
        );
        tracing::debug!("Endpoint: {}", endpoint);

        let active = self
            .identity
            .active_identity()
            .await
            .map_err(ConfigurationError::IdentityCheck)?;
        if active != required {
            return Err(ConfigurationError::IdentityMismatch {
                required: required.to_string(),
                active,
            });
        }
        tracing::info!("Verified gcloud account: {}", active);

        if let Some(account) = &self.config.impersonate_service_account {
            tracing::info!("Using service account impersonation: {}", account);
        }
        self.credentials
            .get_access_token()
            .await
            .map_err(ConfigurationError::Token)?;

        self.validated.store(true, Ordering::Release);
        Ok(())
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ImagePayload, GenerationError> {
        if !self.validated.load(Ordering::Acquire) {
            return Err(GenerationError::NotValidated);
        }
        let endpoint = self
            .config
            .endpoint()
            .ok_or(ConfigurationError::MissingSetting("GOOGLE_CLOUD_PROJECT"))?;
        let token = self.credentials.get_access_token().await?;

        let body = PredictRequest::new(request);
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(token.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PredictResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.map_request_error(e)
            } else {
                GenerationError::InvalidResponse(e.to_string())
            }
        })?;
        extract_image(parsed)
    }

    fn params(&self) -> GenerationParams {
        let seed = self
            .image
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen_range(0..1_000_000));
        GenerationParams {
            width: self.image.width,
            height: self.image.height,
            guidance: self.image.guidance,
            seed,
            format: self.image.format,
        }
    }
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
    parameters: PredictParameters<'a>,
}

#[derive(Debug, Serialize)]
struct Instance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters<'a> {
    sample_count: u32,
    negative_prompt: &'a str,
    width: u32,
    height: u32,
    aspect_ratio: String,
    guidance: f32,
    seed: u32,
    format: ImageFormat,
}

impl<'a> PredictRequest<'a> {
    fn new(request: &'a GenerationRequest) -> Self {
        let params = &request.params;
        Self {
            instances: [Instance {
                prompt: &request.prompt,
            }],
            parameters: PredictParameters {
                sample_count: 1,
                negative_prompt: &request.negative_prompt,
                width: params.width,
                height: params.height,
                aspect_ratio: params.aspect_ratio(),
                guidance: params.guidance,
                seed: params.seed,
                format: params.format,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PredictResponse {
    candidates: Option<Vec<Candidate>>,
    predictions: Option<Vec<Prediction>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

/// Pull the image out of whichever response shape the model returned
fn extract_image(response: PredictResponse) -> Result<ImagePayload, GenerationError> {
    if let Some(candidates) = response.candidates {
        let candidate = candidates
            .into_iter()
            .next()
            .ok_or(GenerationError::NoImageData)?;

        let inline = candidate.content.and_then(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.inline_data)
                .find(|data| data.mime_type.starts_with("image/"))
        });
        return inline
            .map(|data| data.data)
            .or(candidate.image)
            .map(ImagePayload::Base64)
            .ok_or(GenerationError::NoImageData);
    }

    if let Some(predictions) = response.predictions {
        return predictions
            .into_iter()
            .next()
            .and_then(|prediction| prediction.bytes_base64_encoded)
            .map(ImagePayload::Base64)
            .ok_or(GenerationError::NoImageData);
    }

    Err(GenerationError::InvalidResponse(
        "expected candidates or predictions".to_string(),
    ))
}
