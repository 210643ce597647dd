use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CatalogError;
use crate::store::{Document, DocumentStore, ListQuery};

const TESTIMONIALS_COLLECTION: &str = "testimonials";
const DEFAULT_LIST_LIMIT: usize = 50;

/// Label stored when a visitor leaves the name blank.
pub const ANONYMOUS_NAME: &str = "Anónimo";
pub const MIN_MESSAGE_CHARS: usize = 10;

/// Customer testimonial. Immutable once created; there is no update or
/// delete path in this workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: String,
    pub name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestimonialFields {
    name: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl Testimonial {
    fn from_document(document: Document) -> Result<Self, CatalogError> {
        let fields: TestimonialFields = serde_json::from_value(document.data)?;
        Ok(Self {
            id: document.id,
            name: fields.name,
            message: fields.message,
            created_at: fields.created_at,
        })
    }
}

pub struct TestimonialRepository;

impl TestimonialRepository {
    pub async fn create(
        store: &dyn DocumentStore,
        name: Option<&str>,
        message: &str,
    ) -> Result<Testimonial, CatalogError> {
        let message = message.trim();
        if message.chars().count() < MIN_MESSAGE_CHARS {
            return Err(CatalogError::MessageTooShort);
        }

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(ANONYMOUS_NAME);

        let fields = TestimonialFields {
            name: name.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        };

        let document = store
            .insert(TESTIMONIALS_COLLECTION, serde_json::to_value(&fields)?)
            .await?;

        Ok(Testimonial {
            id: document.id,
            name: fields.name,
            message: fields.message,
            created_at: fields.created_at,
        })
    }

    /// Newest first, capped at `limit` (default 50).
    pub async fn list(
        store: &dyn DocumentStore,
        limit: Option<usize>,
    ) -> Result<Vec<Testimonial>, CatalogError> {
        let documents = store
            .list(
                TESTIMONIALS_COLLECTION,
                ListQuery::order_by_desc("createdAt")
                    .with_limit(limit.unwrap_or(DEFAULT_LIST_LIMIT)),
            )
            .await?;

        documents
            .into_iter()
            .map(Testimonial::from_document)
            .collect()
    }
}
