//! Document store layer.
//!
//! This module provides:
//! - The `DocumentStore` trait: the four operations the projector needs
//!   (get, create, update, delete) against id-keyed JSON documents
//! - The search-backend implementation over HTTP
//! - An in-memory implementation for tests and local development
//!
//! Partial-update semantics: `update` merges the supplied fields into the
//! stored document at the top level and leaves every other field untouched.

mod error;
mod memory;
mod search;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use search::SearchStore;

use async_trait::async_trait;
use serde_json::Value;

/// The document collections the projector writes to.
///
/// Projects, timelines, and metadata hold parent documents served through
/// the accessor; payments are standalone root documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Projects,
    Timelines,
    Metadata,
    Payments,
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Collection::Projects => "projects",
            Collection::Timelines => "timelines",
            Collection::Metadata => "metadata",
            Collection::Payments => "payments",
        };
        write!(f, "{}", s)
    }
}

/// Key-document store with get-modify-update semantics.
///
/// There is no optimistic-concurrency guard across `get` and `update`:
/// concurrent writers to the same document id can lose updates. Upstream
/// per-key partition ordering is the only mitigation.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id.
    async fn get(&self, collection: Collection, id: &str) -> Result<Value, StoreError>;

    /// Create a brand-new document. Fails with `Conflict` if one exists.
    async fn create(&self, collection: Collection, id: &str, body: &Value)
        -> Result<(), StoreError>;

    /// Merge `partial`'s top-level fields into an existing document.
    /// Fails with `NotFound` if the document is absent.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        partial: &Value,
    ) -> Result<(), StoreError>;

    /// Delete a document by id. Fails with `NotFound` if absent.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    /// Cheap reachability probe for readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Document store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store base URL (example: http://localhost:9200).
    pub base_url: String,

    /// Index name backing the projects collection.
    pub project_index: String,

    /// Index name backing the timelines collection.
    pub timeline_index: String,

    /// Index name backing the metadata collection.
    pub metadata_index: String,

    /// Index name backing the payments collection.
    pub payment_index: String,

    /// Well-known id of the metadata singleton document.
    pub metadata_doc_id: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9200".to_string(),
            project_index: "projects".to_string(),
            timeline_index: "timelines".to_string(),
            metadata_index: "metadata".to_string(),
            payment_index: "customerPayments".to_string(),
            metadata_doc_id: "1".to_string(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            base_url: std::env::var("PROJVIEW_STORE_URL").unwrap_or(defaults.base_url),
            project_index: std::env::var("PROJVIEW_PROJECT_INDEX").unwrap_or(defaults.project_index),
            timeline_index: std::env::var("PROJVIEW_TIMELINE_INDEX")
                .unwrap_or(defaults.timeline_index),
            metadata_index: std::env::var("PROJVIEW_METADATA_INDEX")
                .unwrap_or(defaults.metadata_index),
            payment_index: std::env::var("PROJVIEW_PAYMENT_INDEX")
                .unwrap_or(defaults.payment_index),
            metadata_doc_id: std::env::var("PROJVIEW_METADATA_DOC_ID")
                .unwrap_or(defaults.metadata_doc_id),
        }
    }

    /// The index name backing a logical collection.
    pub fn index_for(&self, collection: Collection) -> &str {
        match collection {
            Collection::Projects => &self.project_index,
            Collection::Timelines => &self.timeline_index,
            Collection::Metadata => &self.metadata_index,
            Collection::Payments => &self.payment_index,
        }
    }
}
