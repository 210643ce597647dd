use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use super::{Document, DocumentStore, ListQuery, Order, StoreError};
use crate::config::DocumentStoreConfig;

/// JSON REST client for the managed document store. Collections live under
/// `{base}/v1/{collection}`, documents under `{base}/v1/{collection}/{id}`.
pub struct RestDocumentStore {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    documents: Vec<WireDocument>,
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    id: String,
    data: Value,
}

impl RestDocumentStore {
    pub fn new(config: &DocumentStoreConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/v1/{}", self.base_url, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/v1/{}/{}", self.base_url, collection, id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key.expose_secret()),
            None => request,
        }
    }

    fn check_status(
        &self,
        status: reqwest::StatusCode,
        collection: &str,
        id: Option<&str>,
    ) -> Result<(), StoreError> {
        if status.is_success() {
            return Ok(());
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
        }
        if status.is_server_error() {
            return Err(StoreError::Unavailable(status.to_string()));
        }
        Err(StoreError::Status(status))
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    #[instrument(name = "store.insert", skip(self, data))]
    async fn insert(&self, collection: &str, data: Value) -> Result<Document, StoreError> {
        let response = self
            .authorize(self.http.post(self.collection_url(collection)))
            .json(&data)
            .send()
            .await?;

        self.check_status(response.status(), collection, None)?;

        let body: InsertResponse = response.json().await?;
        Ok(Document { id: body.id, data })
    }

    #[instrument(name = "store.update", skip(self, data))]
    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        let response = self
            .authorize(self.http.patch(self.document_url(collection, id)))
            .json(&data)
            .send()
            .await?;

        self.check_status(response.status(), collection, Some(id))
    }

    #[instrument(name = "store.delete", skip(self))]
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .authorize(self.http.delete(self.document_url(collection, id)))
            .send()
            .await?;

        self.check_status(response.status(), collection, Some(id))
    }

    #[instrument(name = "store.list", skip(self))]
    async fn list(&self, collection: &str, query: ListQuery) -> Result<Vec<Document>, StoreError> {
        let mut request = self.authorize(self.http.get(self.collection_url(collection)));

        if let Some((field, order)) = &query.order_by {
            let order = match order {
                Order::Asc => "asc",
                Order::Desc => "desc",
            };
            request = request.query(&[("orderBy", field.as_str()), ("order", order)]);
        }
        if let Some(limit) = query.limit {
            request = request.query(&[("limit", limit)]);
        }

        let response = request.send().await?;
        self.check_status(response.status(), collection, None)?;

        let body: ListResponse = response.json().await?;
        Ok(body
            .documents
            .into_iter()
            .map(|d| Document {
                id: d.id,
                data: d.data,
            })
            .collect())
    }
}
