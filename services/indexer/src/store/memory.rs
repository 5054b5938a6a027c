//! In-memory document store.
//!
//! Backs the integration tests and local development; implements the same
//! partial-update semantics as the search backend.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Collection, DocumentStore, StoreError};

/// In-memory `DocumentStore` implementation.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<(Collection, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection. Test helper.
    pub async fn count(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .await
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        self.documents
            .read()
            .await
            .get(&(collection, id.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })
    }

    async fn create(
        &self,
        collection: Collection,
        id: &str,
        body: &Value,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let key = (collection, id.to_string());
        if documents.contains_key(&key) {
            return Err(StoreError::Conflict {
                collection,
                id: id.to_string(),
            });
        }
        documents.insert(key, body.clone());
        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        partial: &Value,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let key = (collection, id.to_string());
        let stored = documents.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            collection,
            id: id.to_string(),
        })?;

        match (stored.as_object_mut(), partial.as_object()) {
            (Some(target), Some(fields)) => {
                for (name, value) in fields {
                    target.insert(name.clone(), value.clone());
                }
            }
            // A non-object body replaces the document wholesale.
            _ => *stored = partial.clone(),
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        documents
            .remove(&(collection, id.to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryStore::new();
        store
            .create(Collection::Projects, "1", &json!({"id": 1, "name": "a"}))
            .await
            .unwrap();
        let doc = store.get(Collection::Projects, "1").await.unwrap();
        assert_eq!(doc["name"], json!("a"));
    }

    #[tokio::test]
    async fn test_create_conflicts_on_existing_id() {
        let store = MemoryStore::new();
        store
            .create(Collection::Projects, "1", &json!({"id": 1}))
            .await
            .unwrap();
        let err = store
            .create(Collection::Projects, "1", &json!({"id": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_merges_top_level_fields() {
        let store = MemoryStore::new();
        store
            .create(Collection::Projects, "1", &json!({"id": 1, "name": "a", "status": "draft"}))
            .await
            .unwrap();
        store
            .update(Collection::Projects, "1", &json!({"name": "b"}))
            .await
            .unwrap();
        let doc = store.get(Collection::Projects, "1").await.unwrap();
        assert_eq!(doc["name"], json!("b"));
        assert_eq!(doc["status"], json!("draft"));
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(Collection::Timelines, "9", &json!({"name": "b"}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store.delete(Collection::Projects, "9").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
