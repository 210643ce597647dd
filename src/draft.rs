use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use thiserror::Error;
use uuid::Uuid;

use crate::catalog::Project;

/// Hands out preview handles and counts the ones still live. Preview handles
/// stand in for client-side object URLs: they must be released on every exit
/// path or the client leaks memory until page reload.
#[derive(Debug, Clone, Default)]
pub struct PreviewTracker {
    active: Arc<AtomicUsize>,
}

impl PreviewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> PreviewHandle {
        self.active.fetch_add(1, Ordering::SeqCst);
        PreviewHandle {
            id: Uuid::new_v4(),
            active: Arc::clone(&self.active),
            released: false,
        }
    }

    /// Number of handles not yet released.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Transient, locally-resolvable display handle for a not-yet-uploaded image.
/// Released explicitly on detach and on draft discard; dropping an unreleased
/// handle releases it as well, so no exit path can leak.
#[derive(Debug)]
pub struct PreviewHandle {
    id: Uuid,
    active: Arc<AtomicUsize>,
    released: bool,
}

impl PreviewHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Local binary payload attached to a draft before upload.
#[derive(Debug, Clone)]
pub struct AttachedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    Pending,
    Uploading,
    Success,
    Error,
}

/// One image in a draft's gallery. Lifecycle:
/// `Pending -> Uploading -> Success | Error`. Images loaded from a persisted
/// record start in `Success` with a durable URL and no local payload.
#[derive(Debug)]
pub struct DraftImage {
    source: Option<AttachedFile>,
    preview: Option<PreviewHandle>,
    remote_url: Option<String>,
    status: ImageStatus,
}

impl DraftImage {
    pub(crate) fn pending(source: AttachedFile, preview: PreviewHandle) -> Self {
        Self {
            source: Some(source),
            preview: Some(preview),
            remote_url: None,
            status: ImageStatus::Pending,
        }
    }

    pub(crate) fn uploaded(remote_url: String) -> Self {
        Self {
            source: None,
            preview: None,
            remote_url: Some(remote_url),
            status: ImageStatus::Success,
        }
    }

    pub fn status(&self) -> ImageStatus {
        self.status
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.source.as_ref().map(|f| f.name.as_str())
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    pub(crate) fn set_status(&mut self, status: ImageStatus) {
        self.status = status;
    }

    pub(crate) fn take_source(&mut self) -> Option<AttachedFile> {
        self.source.take()
    }

    pub(crate) fn restore_source(&mut self, source: AttachedFile) {
        self.source = Some(source);
    }

    pub(crate) fn mark_uploaded(&mut self, remote_url: String) {
        self.remote_url = Some(remote_url);
        self.status = ImageStatus::Success;
    }

    fn release_preview(&mut self) {
        if let Some(preview) = self.preview.as_mut() {
            preview.release();
        }
        self.preview = None;
    }
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("no attached image at index {0}")]
    IndexOutOfRange(usize),
}

/// Field-scoped validation failure. Local and recoverable; submission is
/// blocked but nothing touches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

/// In-memory staging area for a project record being created or edited.
#[derive(Debug, Default)]
pub struct ProjectDraft {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub category: String,
    images: Vec<DraftImage>,
}

impl ProjectDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft pre-populated from a persisted record. Existing gallery URLs are
    /// loaded as `Success` images, so re-saving without touching them performs
    /// zero uploads.
    pub fn from_record(record: &Project) -> Self {
        Self {
            id: Some(record.id.clone()),
            name: record.name.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            images: record
                .gallery_images
                .iter()
                .cloned()
                .map(DraftImage::uploaded)
                .collect(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }

    /// Appends freshly selected files as `Pending` images, each with its own
    /// preview handle.
    pub fn attach_images(&mut self, files: Vec<AttachedFile>, previews: &PreviewTracker) {
        for file in files {
            let preview = previews.register();
            self.images.push(DraftImage::pending(file, preview));
        }
    }

    /// Appends an already-durable image reference (used when the client sends
    /// back the existing gallery during an edit).
    pub fn attach_uploaded(&mut self, remote_url: impl Into<String>) {
        self.images.push(DraftImage::uploaded(remote_url.into()));
    }

    /// Removes the image at `index`, releasing its preview handle first.
    pub fn detach_image(&mut self, index: usize) -> Result<(), DraftError> {
        if index >= self.images.len() {
            return Err(DraftError::IndexOutOfRange(index));
        }
        self.images[index].release_preview();
        self.images.remove(index);
        Ok(())
    }

    pub fn images(&self) -> &[DraftImage] {
        &self.images
    }

    pub(crate) fn images_mut(&mut self) -> &mut [DraftImage] {
        &mut self.images
    }

    /// Submit-time validation; not run on every keystroke.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError {
                field: "name",
                message: "project name is required",
            });
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError {
                field: "description",
                message: "project description is required",
            });
        }
        if self.images.is_empty() {
            return Err(ValidationError {
                field: "images",
                message: "attach at least one image",
            });
        }
        Ok(())
    }

    /// Discards the draft, releasing every outstanding preview handle.
    pub fn discard(mut self) {
        for image in &mut self.images {
            image.release_preview();
        }
    }
}
