pub mod memory;
mod rest;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use rest::RestDocumentStore;

/// A stored document: store-assigned opaque id plus its JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Listing options: optional single-field ordering and a result cap.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub order_by: Option<(String, Order)>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn order_by_desc(field: impl Into<String>) -> Self {
        Self {
            order_by: Some((field.into(), Order::Desc)),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("document store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("document store returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to decode document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Collection-scoped CRUD against the remote document store. No caching:
/// every `list` re-reads the store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persists `data` under a fresh store-assigned id.
    async fn insert(&self, collection: &str, data: Value) -> Result<Document, StoreError>;

    /// Overwrites the top-level fields present in `data`; other fields keep
    /// their stored values. `NotFound` if the id does not exist.
    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn list(&self, collection: &str, query: ListQuery) -> Result<Vec<Document>, StoreError>;
}
