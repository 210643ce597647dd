mod projects;
mod testimonials;

use thiserror::Error;

pub use projects::{NewProject, Project, ProjectRepository};
pub use testimonials::{
    ANONYMOUS_NAME, MIN_MESSAGE_CHARS, Testimonial, TestimonialRepository,
};

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to decode record: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("message must be at least {MIN_MESSAGE_CHARS} characters")]
    MessageTooShort,
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::Store(StoreError::NotFound { .. }))
    }
}
