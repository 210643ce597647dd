use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::MediaHostConfig;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media host request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("media host returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("media host response carries no durable URL")]
    MalformedResponse,
    #[error("image has no local payload to upload")]
    MissingPayload,
}

/// Boundary to the managed image host. One call per image; the host returns a
/// publicly retrievable URL on success.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, MediaError>;
}

/// HTTP media host client. Posts `multipart/form-data` with an unsigned
/// upload preset; the per-request timeout is the only timeout in the upload
/// path, so a stuck transfer always resolves to an error.
pub struct MediaHostService {
    http: reqwest::Client,
    upload_url: String,
    upload_preset: String,
    upload_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

impl MediaHostService {
    pub fn new(config: &MediaHostConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            upload_url: format!("{}/image/upload", config.base_url.trim_end_matches('/')),
            upload_preset: config.upload_preset.clone(),
            upload_timeout: Duration::from_secs(config.upload_timeout_secs),
        }
    }
}

#[async_trait]
impl MediaHost for MediaHostService {
    #[instrument(name = "media.upload", skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        let mut part = multipart::Part::bytes(bytes.to_vec()).file_name(filename.to_string());
        if let Some(content_type) = content_type {
            part = part.mime_str(content_type)?;
        }

        let form = multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MediaError::Status(response.status()));
        }

        let body: UploadResponse = response.json().await?;
        body.secure_url
            .filter(|url| !url.is_empty())
            .ok_or(MediaError::MalformedResponse)
    }
}

/// Rewrites a media host delivery URL to request an optimized rendition
/// (auto format, auto quality, optional width cap, never upscaled). URLs that
/// do not look like host delivery URLs pass through untouched.
pub fn optimize_delivery_url(url: &str, width: Option<u32>) -> String {
    if !url.contains("/upload/") {
        return url.to_string();
    }

    let mut transforms = vec!["f_auto".to_string(), "q_auto".to_string()];
    if let Some(width) = width {
        transforms.push(format!("w_{width}"));
    }
    transforms.push("c_limit".to_string());

    url.replacen("/upload/", &format!("/upload/{}/", transforms.join(",")), 1)
}
