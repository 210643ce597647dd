use std::{
    cmp::Ordering as CmpOrdering,
    collections::HashMap,
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{Document, DocumentStore, ListQuery, Order, StoreError};

/// In-memory document store used by tests and local development. Mirrors the
/// REST store's semantics: store-assigned string ids, shallow-merge updates,
/// single-field ordering.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<(String, Value)>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<(String, Value)>>> {
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Order keys as timestamps when both parse as RFC 3339, falling back to a
/// string comparison otherwise.
fn compare_keys(a: &Value, b: &Value) -> CmpOrdering {
    if let (Some(a), Some(b)) = (a.as_str(), b.as_str()) {
        if let (Ok(a), Ok(b)) = (
            a.parse::<DateTime<Utc>>(),
            b.parse::<DateTime<Utc>>(),
        ) {
            return a.cmp(&b);
        }
        return a.cmp(b);
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(CmpOrdering::Equal),
        _ => CmpOrdering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, data: Value) -> Result<Document, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), data.clone()));
        Ok(Document { id, data })
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        let mut collections = self.lock();
        let documents = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let existing = documents
            .iter_mut()
            .find(|(doc_id, _)| doc_id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        match (existing.1.as_object_mut(), data.as_object()) {
            (Some(target), Some(patch)) => {
                for (key, value) in patch {
                    target.insert(key.clone(), value.clone());
                }
            }
            _ => existing.1 = data,
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.lock();
        let documents = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let before = documents.len();
        documents.retain(|(doc_id, _)| doc_id != id);
        if documents.len() == before {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn list(&self, collection: &str, query: ListQuery) -> Result<Vec<Document>, StoreError> {
        let collections = self.lock();
        let mut documents: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some((field, order)) = &query.order_by {
            documents.sort_by(|a, b| {
                let a_key = a.data.get(field).unwrap_or(&Value::Null);
                let b_key = b.data.get(field).unwrap_or(&Value::Null);
                let ordering = compare_keys(a_key, b_key);
                match order {
                    Order::Asc => ordering,
                    Order::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            documents.truncate(limit);
        }

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn insert_assigns_distinct_ids() {
        let store = MemoryDocumentStore::new();
        let a = store.insert("projects", json!({"name": "a"})).await.unwrap();
        let b = store.insert("projects", json!({"name": "b"})).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn update_merges_top_level_fields() {
        let store = MemoryDocumentStore::new();
        let doc = store
            .insert(
                "projects",
                json!({"name": "a", "createdAt": "2026-01-01T00:00:00Z"}),
            )
            .await
            .unwrap();

        store
            .update("projects", &doc.id, json!({"name": "b"}))
            .await
            .unwrap();

        let docs = store.list("projects", ListQuery::default()).await.unwrap();
        assert_eq!(docs[0].data["name"], "b");
        assert_eq!(docs[0].data["createdAt"], "2026-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn update_missing_document_is_not_found() {
        let store = MemoryDocumentStore::new();
        store.insert("projects", json!({})).await.unwrap();
        let err = store
            .update("projects", "missing", json!({"name": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_orders_by_timestamp_descending() {
        let store = MemoryDocumentStore::new();
        store
            .insert("t", json!({"createdAt": "2026-01-01T00:00:00Z", "n": 1}))
            .await
            .unwrap();
        store
            .insert("t", json!({"createdAt": "2026-03-01T00:00:00Z", "n": 3}))
            .await
            .unwrap();
        store
            .insert("t", json!({"createdAt": "2026-02-01T00:00:00Z", "n": 2}))
            .await
            .unwrap();

        let docs = store
            .list("t", ListQuery::order_by_desc("createdAt"))
            .await
            .unwrap();
        let order: Vec<i64> = docs.iter().map(|d| d.data["n"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn list_applies_limit_after_ordering() {
        let store = MemoryDocumentStore::new();
        for n in 0..5 {
            store
                .insert("t", json!({"createdAt": format!("2026-01-0{}T00:00:00Z", n + 1)}))
                .await
                .unwrap();
        }

        let docs = store
            .list("t", ListQuery::order_by_desc("createdAt").with_limit(2))
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[tokio::test]
    async fn delete_removes_the_document() {
        let store = MemoryDocumentStore::new();
        let doc = store.insert("t", json!({})).await.unwrap();
        store.delete("t", &doc.id).await.unwrap();
        assert!(store.list("t", ListQuery::default()).await.unwrap().is_empty());
        assert!(matches!(
            store.delete("t", &doc.id).await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }
}
