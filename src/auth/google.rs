use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::watch;
use tracing::instrument;

use super::{AuthError, Identity, IdentityProvider};
use crate::config::IdentityProviderConfig;

/// Verifies Google ID token assertions against the tokeninfo endpoint and
/// tracks the resulting session. One instance serves the whole process; the
/// admin panel is a single trusted session, not a multi-user system.
pub struct GoogleIdentityProvider {
    http: reqwest::Client,
    tokeninfo_url: String,
    current: watch::Sender<Option<Identity>>,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    email: Option<String>,
    email_verified: Option<String>,
}

impl GoogleIdentityProvider {
    pub fn new(config: &IdentityProviderConfig, http: reqwest::Client) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            http,
            tokeninfo_url: config.tokeninfo_url.clone(),
            current,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    #[instrument(name = "auth.provider_sign_in", skip_all)]
    async fn sign_in(&self, assertion: &str) -> Result<Identity, AuthError> {
        let response = self
            .http
            .get(&self.tokeninfo_url)
            .query(&[("id_token", assertion)])
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "tokeninfo returned {}",
                response.status()
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let email = info
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AuthError::Provider("assertion carries no email".to_string()))?;

        if info.email_verified.as_deref() != Some("true") {
            return Err(AuthError::Provider(format!(
                "email {email} is not verified"
            )));
        }

        let identity = Identity { email };
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) {
        self.current.send_replace(None);
    }

    fn sessions(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}
