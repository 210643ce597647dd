use std::env;

use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct RemoteServerConfig {
    pub listen_addr: String,
    pub allowed_emails: Vec<String>,
    pub store: DocumentStoreConfig,
    pub media: Option<MediaHostConfig>,
    pub identity: IdentityProviderConfig,
}

#[derive(Debug, Clone)]
pub struct DocumentStoreConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
}

impl DocumentStoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            env::var("DOCSTORE_BASE_URL").map_err(|_| ConfigError::MissingVar("DOCSTORE_BASE_URL"))?;

        let api_key = env::var("DOCSTORE_API_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .map(|v| SecretString::new(v.into()));

        tracing::info!(base_url = %base_url, "Document store config loaded");

        Ok(Self { base_url, api_key })
    }
}

#[derive(Debug, Clone)]
pub struct MediaHostConfig {
    pub base_url: String,
    /// Unsigned upload preset registered with the media host.
    pub upload_preset: String,
    pub upload_timeout_secs: u64,
}

impl MediaHostConfig {
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let base_url = match env::var("MEDIA_HOST_BASE_URL") {
            Ok(v) if !v.is_empty() => v,
            _ => {
                tracing::info!("MEDIA_HOST_BASE_URL not set, media uploads disabled");
                return Ok(None);
            }
        };

        let upload_preset = env::var("MEDIA_UPLOAD_PRESET")
            .map_err(|_| ConfigError::MissingVar("MEDIA_UPLOAD_PRESET"))?;

        let upload_timeout_secs = env::var("MEDIA_UPLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        tracing::info!(
            base_url = %base_url,
            upload_timeout_secs,
            "Media host config loaded"
        );

        Ok(Some(Self {
            base_url,
            upload_preset,
            upload_timeout_secs,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct IdentityProviderConfig {
    pub tokeninfo_url: String,
}

impl IdentityProviderConfig {
    pub fn from_env() -> Self {
        let tokeninfo_url = env::var("IDENTITY_TOKENINFO_URL")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com/tokeninfo".to_string());

        Self { tokeninfo_url }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    MissingVar(&'static str),
    #[error("invalid value for environment variable `{0}`")]
    InvalidVar(&'static str),
    #[error("ADMIN_ALLOWED_EMAILS contains no usable entries")]
    EmptyAllowList,
}

impl RemoteServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr =
            env::var("SERVER_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let allowed_emails = env::var("ADMIN_ALLOWED_EMAILS")
            .map_err(|_| ConfigError::MissingVar("ADMIN_ALLOWED_EMAILS"))?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        if allowed_emails.is_empty() {
            return Err(ConfigError::EmptyAllowList);
        }

        let store = DocumentStoreConfig::from_env()?;
        let media = MediaHostConfig::from_env()?;
        let identity = IdentityProviderConfig::from_env();

        tracing::info!(
            listen_addr = %listen_addr,
            allowed = allowed_emails.len(),
            "Server config loaded"
        );

        Ok(Self {
            listen_addr,
            allowed_emails,
            store,
            media,
            identity,
        })
    }
}
