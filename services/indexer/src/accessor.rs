//! Document accessor: the read-modify-write seam shared by every nested
//! merge handler.
//!
//! Fetches the parent document, runs a transform over it, and writes the
//! result back as a partial top-level update. The metadata singleton is
//! lazily created on first touch; it is never provisioned externally.
//!
//! There is no optimistic-concurrency guard between the fetch and the write,
//! so two concurrent updates to the same parent id can lose one writer's
//! change. Upstream per-key partition ordering is the only mitigation.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::store::{Collection, DocumentStore, StoreError};

/// Applies transforms to parent documents.
#[derive(Clone)]
pub struct DocumentAccessor {
    store: Arc<dyn DocumentStore>,
    metadata_doc_id: String,
}

impl DocumentAccessor {
    pub fn new(store: Arc<dyn DocumentStore>, metadata_doc_id: String) -> Self {
        Self {
            store,
            metadata_doc_id,
        }
    }

    /// The well-known id of the metadata singleton document.
    pub fn metadata_doc_id(&self) -> &str {
        &self.metadata_doc_id
    }

    /// Fetch `id` from `collection`, apply `transform`, write the result back
    /// as a partial update.
    ///
    /// `NotFound` propagates to the caller for the project and timeline
    /// collections. For the metadata collection the singleton is created
    /// first (empty body except the id) and the transform runs over the
    /// fresh document.
    pub async fn apply_to_document<F, Fut>(
        &self,
        collection: Collection,
        id: &str,
        transform: F,
    ) -> Result<(), StoreError>
    where
        F: FnOnce(Value) -> Fut + Send,
        Fut: Future<Output = Value> + Send,
    {
        let current = match self.store.get(collection, id).await {
            Ok(doc) => doc,
            Err(err) if err.is_not_found() && collection == Collection::Metadata => {
                info!("No metadata document found, creating it");
                let body = Self::metadata_seed(id);
                self.store.create(Collection::Metadata, id, &body).await?;
                body
            }
            Err(err) => return Err(err),
        };

        let updated = transform(current).await;
        self.store.update(collection, id, &updated).await
    }

    /// Apply a transform to the metadata singleton.
    pub async fn apply_to_metadata<F, Fut>(&self, transform: F) -> Result<(), StoreError>
    where
        F: FnOnce(Value) -> Fut + Send,
        Fut: Future<Output = Value> + Send,
    {
        let id = self.metadata_doc_id.clone();
        self.apply_to_document(Collection::Metadata, &id, transform)
            .await
    }

    // The configured id is kept numeric in the document body when it parses
    // as one, matching how the producer addresses the singleton.
    fn metadata_seed(id: &str) -> Value {
        let id_value = id
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(id));
        serde_json::json!({ "id": id_value })
    }
}
