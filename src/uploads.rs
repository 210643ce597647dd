use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use crate::{
    draft::{DraftImage, ImageStatus},
    media::{MediaError, MediaHost},
};

/// Single-image failure that aborted the batch. Earlier successes keep their
/// durable URLs; a retried submit skips them.
#[derive(Debug, Error)]
#[error("upload failed for image {index} ({name}): {source}")]
pub struct UploadBatchError {
    pub index: usize,
    pub name: String,
    #[source]
    pub source: MediaError,
}

/// Turns a draft's image list into durable references, sequentially and in
/// attachment order. Fail-fast: the first failure aborts the rest of the
/// batch without rolling back what already uploaded.
pub struct UploadOrchestrator {
    media: Arc<dyn MediaHost>,
}

impl UploadOrchestrator {
    pub fn new(media: Arc<dyn MediaHost>) -> Self {
        Self { media }
    }

    #[instrument(name = "uploads.run_batch", skip_all, fields(total = images.len()))]
    pub async fn run(&self, images: &mut [DraftImage]) -> Result<Vec<String>, UploadBatchError> {
        let mut references = Vec::with_capacity(images.len());

        for (index, image) in images.iter_mut().enumerate() {
            if image.status() == ImageStatus::Success {
                if let Some(url) = image.remote_url() {
                    references.push(url.to_string());
                    continue;
                }
            }

            image.set_status(ImageStatus::Uploading);

            let Some(file) = image.take_source() else {
                image.set_status(ImageStatus::Error);
                return Err(UploadBatchError {
                    index,
                    name: "<missing payload>".to_string(),
                    source: MediaError::MissingPayload,
                });
            };

            match self
                .media
                .upload(&file.name, file.content_type.as_deref(), &file.bytes)
                .await
            {
                Ok(url) => {
                    tracing::debug!(index, name = %file.name, "image uploaded");
                    image.mark_uploaded(url.clone());
                    references.push(url);
                }
                Err(source) => {
                    tracing::warn!(index, name = %file.name, error = %source, "upload failed, aborting batch");
                    // Keep the payload so a retried submit can re-attempt it.
                    image.restore_source(file);
                    image.set_status(ImageStatus::Error);
                    return Err(UploadBatchError {
                        index,
                        name: image.file_name().unwrap_or_default().to_string(),
                        source,
                    });
                }
            }
        }

        Ok(references)
    }
}
