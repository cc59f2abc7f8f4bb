//! Workflow CRUD service over a pluggable storage gateway
//!
//! The service owns the document lifecycle; persistence is behind the
//! async `WorkflowStorage` trait so embedders can supply their own
//! backend. `MemoryStorage` covers tests and single-process use.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use serde::Deserialize;

use easel_graph::WorkflowGraph;

use crate::document::WorkflowDocument;
use crate::error::{Result, WorkflowError};

/// Persistence gateway for workflow documents
#[async_trait]
pub trait WorkflowStorage: Send + Sync {
    async fn insert(&self, doc: WorkflowDocument) -> Result<()>;
    async fn fetch(&self, id: &str) -> Result<Option<WorkflowDocument>>;
    async fn update(&self, doc: WorkflowDocument) -> Result<()>;
    async fn remove(&self, id: &str) -> Result<bool>;
    async fn list(&self) -> Result<Vec<WorkflowDocument>>;
}

/// In-memory storage backend
#[derive(Default)]
pub struct MemoryStorage {
    documents: RwLock<HashMap<String, WorkflowDocument>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStorage for MemoryStorage {
    async fn insert(&self, doc: WorkflowDocument) -> Result<()> {
        self.documents.write().insert(doc.id.clone(), doc);
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Option<WorkflowDocument>> {
        Ok(self.documents.read().get(id).cloned())
    }

    async fn update(&self, doc: WorkflowDocument) -> Result<()> {
        let mut documents = self.documents.write();
        if !documents.contains_key(&doc.id) {
            return Err(WorkflowError::NotFound(doc.id));
        }
        documents.insert(doc.id.clone(), doc);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        Ok(self.documents.write().remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<WorkflowDocument>> {
        let mut docs: Vec<_> = self.documents.read().values().cloned().collect();
        docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(docs)
    }
}

/// Partial update for a document; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPatch {
    pub name: Option<String>,
    pub data: Option<WorkflowGraph>,
    pub thumbnail: Option<String>,
    pub shared: Option<bool>,
}

/// Document lifecycle operations
pub struct WorkflowService {
    storage: Arc<dyn WorkflowStorage>,
}

impl WorkflowService {
    pub fn new(storage: Arc<dyn WorkflowStorage>) -> Self {
        Self { storage }
    }

    /// Create an empty workflow owned by `owner`
    pub async fn create(&self, owner: &str, name: &str) -> Result<WorkflowDocument> {
        let doc = WorkflowDocument::new(owner, name);
        debug!("Creating workflow '{}' ({}) for {}", doc.name, doc.id, doc.owner);
        self.storage.insert(doc.clone()).await?;
        Ok(doc)
    }

    pub async fn get(&self, id: &str) -> Result<WorkflowDocument> {
        self.storage
            .fetch(id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(id.to_string()))
    }

    /// Apply a partial update; bumps `updated_at` on success
    pub async fn patch(&self, id: &str, patch: WorkflowPatch) -> Result<WorkflowDocument> {
        let mut doc = self.get(id).await?;
        if let Some(name) = patch.name {
            doc.name = name;
        }
        if let Some(data) = patch.data {
            doc.data = data;
        }
        if let Some(thumbnail) = patch.thumbnail {
            doc.thumbnail = Some(thumbnail);
        }
        if let Some(shared) = patch.shared {
            doc.shared = shared;
        }
        doc.touch();
        self.storage.update(doc.clone()).await?;
        Ok(doc)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.storage.remove(id).await? {
            return Err(WorkflowError::NotFound(id.to_string()));
        }
        debug!("Deleted workflow {id}");
        Ok(())
    }

    /// Copy a workflow under a new id, "<name> (copy)", same owner
    pub async fn duplicate(&self, id: &str) -> Result<WorkflowDocument> {
        let source = self.get(id).await?;
        let mut copy = WorkflowDocument::with_graph(
            source.owner,
            format!("{} (copy)", source.name),
            source.data,
        );
        copy.thumbnail = source.thumbnail;
        self.storage.insert(copy.clone()).await?;
        Ok(copy)
    }

    /// The owner's workflows, most recently updated first
    pub async fn list(&self, owner: &str) -> Result<Vec<WorkflowDocument>> {
        Ok(self
            .storage
            .list()
            .await?
            .into_iter()
            .filter(|doc| doc.owner == owner)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_graph::GraphBuilder;

    fn service() -> WorkflowService {
        WorkflowService::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = service();
        let doc = service.create("user-1", "Storyboard").await.unwrap();

        let fetched = service.get(&doc.id).await.unwrap();
        assert_eq!(fetched.name, "Storyboard");
        assert_eq!(fetched.owner, "user-1");
        assert!(fetched.data.nodes.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let service = service();
        assert!(matches!(
            service.get("nope").await,
            Err(WorkflowError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_patch_updates_fields_and_timestamp() {
        let service = service();
        let doc = service.create("user-1", "Draft").await.unwrap();

        let graph = GraphBuilder::new()
            .text_input("t", "hello", (0.0, 0.0))
            .build();
        let patched = service
            .patch(
                &doc.id,
                WorkflowPatch {
                    name: Some("Final".to_string()),
                    data: Some(graph),
                    shared: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(patched.name, "Final");
        assert_eq!(patched.data.nodes.len(), 1);
        assert!(patched.shared);
        assert!(patched.updated_at >= doc.updated_at);
    }

    #[tokio::test]
    async fn test_delete_then_get_fails() {
        let service = service();
        let doc = service.create("user-1", "Ephemeral").await.unwrap();
        service.delete(&doc.id).await.unwrap();
        assert!(service.get(&doc.id).await.is_err());
        assert!(service.delete(&doc.id).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_copies_graph_with_new_id() {
        let service = service();
        let doc = service.create("user-1", "Original").await.unwrap();
        let graph = GraphBuilder::new()
            .image_upload("img", "img://a.png", (0.0, 0.0))
            .build();
        service
            .patch(
                &doc.id,
                WorkflowPatch {
                    data: Some(graph),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let copy = service.duplicate(&doc.id).await.unwrap();
        assert_ne!(copy.id, doc.id);
        assert_eq!(copy.name, "Original (copy)");
        assert_eq!(copy.owner, "user-1");
        assert_eq!(copy.data.nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let service = service();
        let first = service.create("user-1", "First").await.unwrap();
        let second = service.create("user-1", "Second").await.unwrap();
        service
            .patch(
                &first.id,
                WorkflowPatch {
                    name: Some("First updated".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let docs = service.list("user-1").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "First updated");
        assert_eq!(docs[1].id, second.id);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let service = service();
        let mine = service.create("user-1", "Mine").await.unwrap();
        service.create("user-2", "Theirs").await.unwrap();

        let docs = service.list("user-1").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, mine.id);
        assert!(service.list("user-3").await.unwrap().is_empty());
    }
}
