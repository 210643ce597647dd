use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::CatalogError;
use crate::store::{Document, DocumentStore, ListQuery};

const PROJECTS_COLLECTION: &str = "projects";

/// Persisted portfolio project. The first gallery image is the cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub gallery_images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields written on create and update. `createdAt` is set once at creation
/// and never rewritten.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub category: String,
    pub gallery_images: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFields {
    name: String,
    description: String,
    category: String,
    gallery_images: Vec<String>,
    created_at: DateTime<Utc>,
}

impl Project {
    fn from_document(document: Document) -> Result<Self, CatalogError> {
        let fields: ProjectFields = serde_json::from_value(document.data)?;
        Ok(Self {
            id: document.id,
            name: fields.name,
            description: fields.description,
            category: fields.category,
            gallery_images: fields.gallery_images,
            created_at: fields.created_at,
        })
    }
}

pub struct ProjectRepository;

impl ProjectRepository {
    pub async fn create(
        store: &dyn DocumentStore,
        input: NewProject,
    ) -> Result<Project, CatalogError> {
        let fields = ProjectFields {
            name: input.name,
            description: input.description,
            category: input.category,
            gallery_images: input.gallery_images,
            created_at: Utc::now(),
        };

        let document = store
            .insert(PROJECTS_COLLECTION, serde_json::to_value(&fields)?)
            .await?;

        Ok(Project {
            id: document.id,
            name: fields.name,
            description: fields.description,
            category: fields.category,
            gallery_images: fields.gallery_images,
            created_at: fields.created_at,
        })
    }

    /// Overwrites the editable fields of an existing record. `createdAt` is
    /// deliberately absent from the patch.
    pub async fn update(
        store: &dyn DocumentStore,
        id: &str,
        input: NewProject,
    ) -> Result<(), CatalogError> {
        let patch = json!({
            "name": input.name,
            "description": input.description,
            "category": input.category,
            "galleryImages": input.gallery_images,
        });

        store.update(PROJECTS_COLLECTION, id, patch).await?;
        Ok(())
    }

    /// All records, newest first. Always a fresh read from the store.
    pub async fn list(store: &dyn DocumentStore) -> Result<Vec<Project>, CatalogError> {
        let documents = store
            .list(PROJECTS_COLLECTION, ListQuery::order_by_desc("createdAt"))
            .await?;

        documents.into_iter().map(Project::from_document).collect()
    }

    pub async fn delete(store: &dyn DocumentStore, id: &str) -> Result<(), CatalogError> {
        store.delete(PROJECTS_COLLECTION, id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryDocumentStore;

    fn input(name: &str) -> NewProject {
        NewProject {
            name: name.to_string(),
            description: "Fachada en aluminio".to_string(),
            category: "Ventanas".to_string(),
            gallery_images: vec!["https://img.example/a".to_string()],
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamp() {
        let store = MemoryDocumentStore::new();
        let project = ProjectRepository::create(&store, input("Casa Moderna"))
            .await
            .unwrap();

        assert!(!project.id.is_empty());
        assert_eq!(project.gallery_images.len(), 1);

        let listed = ProjectRepository::list(&store).await.unwrap();
        assert_eq!(listed, vec![project]);
    }

    #[tokio::test]
    async fn update_preserves_created_at() {
        let store = MemoryDocumentStore::new();
        let project = ProjectRepository::create(&store, input("Casa Moderna"))
            .await
            .unwrap();

        let mut changed = input("Casa Renovada");
        changed.gallery_images.push("https://img.example/b".to_string());
        ProjectRepository::update(&store, &project.id, changed)
            .await
            .unwrap();

        let listed = ProjectRepository::list(&store).await.unwrap();
        assert_eq!(listed[0].name, "Casa Renovada");
        assert_eq!(listed[0].gallery_images.len(), 2);
        assert_eq!(listed[0].created_at, project.created_at);
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let store = MemoryDocumentStore::new();
        ProjectRepository::create(&store, input("Casa Moderna"))
            .await
            .unwrap();

        let err = ProjectRepository::update(&store, "missing", input("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let store = MemoryDocumentStore::new();
        let first = ProjectRepository::create(&store, input("first"))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = ProjectRepository::create(&store, input("second"))
            .await
            .unwrap();

        let listed = ProjectRepository::list(&store).await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }
}
