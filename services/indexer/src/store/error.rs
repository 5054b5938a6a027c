//! Document store error types.

use thiserror::Error;

use super::Collection;

/// Document store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document does not exist.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: Collection, id: String },

    /// A document already exists at the target id.
    #[error("document already exists: {collection}/{id}")]
    Conflict { collection: Collection, id: String },

    /// The store request could not be sent or the connection failed.
    #[error("store request failed: {0}")]
    Backend(String),

    /// The store answered with an unexpected status.
    #[error("unexpected store response: status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl StoreError {
    /// Whether this error is the not-found case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
