//! gcloud CLI as credential and identity broker

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::outbound::{
    AccessToken, AuthError, CredentialProvider, IdentityProvider,
};

pub struct GcloudCli {
    program: String,
    impersonate_service_account: Option<String>,
}

impl GcloudCli {
    pub fn new(impersonate_service_account: Option<String>) -> Self {
        Self {
            program: "gcloud".to_string(),
            impersonate_service_account,
        }
    }

    fn token_args(&self) -> Vec<String> {
        let mut args = vec![
            "auth".to_string(),
            "print-access-token".to_string(),
        ];
        if let Some(account) = &self.impersonate_service_account {
            args.push(format!("--impersonate-service-account={}", account));
        }
        args
    }

    fn identity_args() -> Vec<String> {
        ["auth", "list", "--filter=status:ACTIVE", "--format=value(account)"]
            .iter()
            .map(|arg| arg.to_string())
            .collect()
    }

    /// Run gcloud and return the first non-empty line of stdout
    async fn run(&self, args: &[String], what: &'static str) -> Result<String, AuthError> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| AuthError::Unavailable(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AuthError::Refused(stderr.trim().to_string()));
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or(AuthError::Empty(what))
    }
}

#[async_trait]
impl CredentialProvider for GcloudCli {
    async fn get_access_token(&self) -> Result<AccessToken, AuthError> {
        let token = self.run(&self.token_args(), "access token").await?;
        Ok(AccessToken::new(token))
    }
}

#[async_trait]
impl IdentityProvider for GcloudCli {
    async fn active_identity(&self) -> Result<String, AuthError> {
        self.run(&Self::identity_args(), "account").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_args_with_impersonation() {
        let plain = GcloudCli::new(None);
        assert_eq!(plain.token_args(), vec!["auth", "print-access-token"]);

        let impersonating = GcloudCli::new(Some("imagegen@proj.iam.gserviceaccount.com".into()));
        assert_eq!(
            impersonating.token_args().last().map(String::as_str),
            Some("--impersonate-service-account=imagegen@proj.iam.gserviceaccount.com")
        );
    }

    #[test]
    fn test_identity_args() {
        assert_eq!(
            GcloudCli::identity_args(),
            vec!["auth", "list", "--filter=status:ACTIVE", "--format=value(account)"]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let cli = GcloudCli {
            program: "definitely-not-a-real-gcloud-binary".to_string(),
            impersonate_service_account: None,
        };
        let result = cli.get_access_token().await;
        assert!(matches!(result, Err(AuthError::Unavailable(_))));
    }
}
