//! HTTP search-backend implementation of the document store.
//!
//! Speaks the document APIs of the search index: `_doc` for get/delete,
//! `_create` for create-if-absent, `_update` with a `doc` body for partial
//! updates.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{Collection, DocumentStore, StoreConfig, StoreError};

/// Document store backed by the search index's HTTP API.
pub struct SearchStore {
    client: reqwest::Client,
    config: StoreConfig,
}

impl SearchStore {
    /// Create a new store client.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn doc_url(&self, collection: Collection, id: &str) -> String {
        format!(
            "{}/{}/_doc/{}",
            self.config.base_url,
            self.config.index_for(collection),
            id
        )
    }

    async fn unexpected(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::UnexpectedStatus { status, body }
    }
}

#[async_trait]
impl DocumentStore for SearchStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        let url = self.doc_url(collection, id);
        debug!(%collection, id, "Fetching document");

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(Self::unexpected(response).await);
        }

        let body: Value = response.json().await?;
        // The document API wraps the stored fields in `_source`.
        body.get("_source").cloned().ok_or_else(|| StoreError::UnexpectedStatus {
            status: 200,
            body: "response missing _source".to_string(),
        })
    }

    async fn create(
        &self,
        collection: Collection,
        id: &str,
        body: &Value,
    ) -> Result<(), StoreError> {
        let url = format!(
            "{}/{}/_create/{}",
            self.config.base_url,
            self.config.index_for(collection),
            id
        );
        debug!(%collection, id, "Creating document");

        let response = self.client.put(&url).json(body).send().await?;
        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(StoreError::Conflict {
                collection,
                id: id.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(Self::unexpected(response).await);
        }
        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        partial: &Value,
    ) -> Result<(), StoreError> {
        let url = format!(
            "{}/{}/_update/{}",
            self.config.base_url,
            self.config.index_for(collection),
            id
        );
        debug!(%collection, id, "Updating document");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "doc": partial }))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(Self::unexpected(response).await);
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let url = self.doc_url(collection, id);
        debug!(%collection, id, "Deleting document");

        let response = self.client.delete(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(Self::unexpected(response).await);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let response = self.client.get(&self.config.base_url).send().await?;
        if !response.status().is_success() {
            return Err(Self::unexpected(response).await);
        }
        Ok(())
    }
}
