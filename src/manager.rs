use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use crate::{
    catalog::{CatalogError, NewProject, Project, ProjectRepository},
    draft::{PreviewTracker, ProjectDraft, ValidationError},
    media::MediaHost,
    store::DocumentStore,
    uploads::{UploadBatchError, UploadOrchestrator},
};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upload(#[from] UploadBatchError),
    #[error(transparent)]
    Store(#[from] CatalogError),
}

/// Ties the workflow together: draft -> upload batch -> catalog write.
/// The draft is borrowed mutably across `submit`, so on any failure the
/// caller still holds it (typed input and uploaded statuses intact) and can
/// retry or discard.
pub struct ContentManager {
    store: Arc<dyn DocumentStore>,
    uploads: UploadOrchestrator,
    previews: PreviewTracker,
}

impl ContentManager {
    pub fn new(store: Arc<dyn DocumentStore>, media: Arc<dyn MediaHost>) -> Self {
        Self {
            store,
            uploads: UploadOrchestrator::new(media),
            previews: PreviewTracker::new(),
        }
    }

    pub fn previews(&self) -> &PreviewTracker {
        &self.previews
    }

    pub fn new_draft(&self) -> ProjectDraft {
        ProjectDraft::new()
    }

    /// Reconciles an "edit" action back into a draft: every existing gallery
    /// URL arrives pre-marked `Success`, so re-saving untouched images costs
    /// zero uploads.
    pub fn start_edit(&self, record: &Project) -> ProjectDraft {
        ProjectDraft::from_record(record)
    }

    /// Validates, uploads what still needs uploading, then creates or updates
    /// the record depending on whether the draft carries an id. Returns the
    /// persisted record id.
    #[instrument(name = "manager.submit", skip_all, fields(project_id = ?draft.id))]
    pub async fn submit(&self, draft: &mut ProjectDraft) -> Result<String, SubmitError> {
        draft.validate()?;

        let gallery_images = self.uploads.run(draft.images_mut()).await?;

        let input = NewProject {
            name: draft.name.trim().to_string(),
            description: draft.description.trim().to_string(),
            category: draft.category.trim().to_string(),
            gallery_images,
        };

        match draft.id.clone() {
            Some(id) => {
                ProjectRepository::update(&*self.store, &id, input).await?;
                tracing::info!(%id, "project updated");
                Ok(id)
            }
            None => {
                let project = ProjectRepository::create(&*self.store, input).await?;
                tracing::info!(id = %project.id, "project created");
                Ok(project.id)
            }
        }
    }

    /// Fresh read of the catalog; called after every successful mutation.
    pub async fn refresh(&self) -> Result<Vec<Project>, CatalogError> {
        ProjectRepository::list(&*self.store).await
    }

    /// Irreversible. Confirming intent with the user is the caller's job.
    #[instrument(name = "manager.delete", skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), CatalogError> {
        ProjectRepository::delete(&*self.store, id).await
    }
}
