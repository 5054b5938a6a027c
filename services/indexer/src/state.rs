//! Application state shared across handlers and the health endpoints.

use std::sync::Arc;

use crate::accessor::DocumentAccessor;
use crate::members::MemberLookup;
use crate::store::DocumentStore;

/// Shared application state.
///
/// Holds the process-wide store and member-service clients; components
/// receive it by injection instead of reaching for ambient globals.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn DocumentStore>,
    accessor: DocumentAccessor,
    members: Arc<dyn MemberLookup>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        members: Arc<dyn MemberLookup>,
        metadata_doc_id: String,
    ) -> Self {
        let accessor = DocumentAccessor::new(store.clone(), metadata_doc_id);
        Self {
            inner: Arc::new(AppStateInner {
                store,
                accessor,
                members,
            }),
        }
    }

    /// Get a reference to the document store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }

    /// Get a reference to the document accessor.
    pub fn accessor(&self) -> &DocumentAccessor {
        &self.inner.accessor
    }

    /// Get a reference to the member lookup client.
    pub fn members(&self) -> &Arc<dyn MemberLookup> {
        &self.inner.members
    }
}
