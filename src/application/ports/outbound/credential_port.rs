//! Credential and identity ports
//!
//! Access tokens and the active account come from an external identity broker.
//! Both are capabilities so tests can substitute stubs.

use std::fmt;

use async_trait::async_trait;

/// Bearer token for the generation service
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the secret itself.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
    #[error("identity provider refused: {0}")]
    Refused(String),
    #[error("identity provider returned an empty {0}")]
    Empty(&'static str),
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_access_token(&self) -> Result<AccessToken, AuthError>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Account currently active in the identity broker
    async fn active_identity(&self) -> Result<String, AuthError>;
}
