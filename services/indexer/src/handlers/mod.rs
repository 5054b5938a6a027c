//! Resource handlers and dispatch registry.
//!
//! Each handler applies create/update/delete messages for one or more
//! resource kinds. Nested sub-entities share a single descriptor-driven
//! engine (`nested`); project members, member invites, and the root
//! documents have dedicated handlers where the protocol diverges.

pub mod contract;
mod invite;
mod member;
pub mod merge;
mod nested;
mod root;

pub use invite::InviteHandler;
pub use member::MemberHandler;
pub use nested::{NestedDescriptor, NestedHandler, OuterScope, ParentKey};
pub use root::{CustomerPaymentHandler, ProjectHandler, TimelineHandler};

use async_trait::async_trait;
use projview_events::Resource;
use serde_json::Value;
use thiserror::Error;

use crate::state::AppState;
use crate::store::StoreError;

/// Result type for handler operations.
pub type HandlerResult = Result<(), ProcessError>;

/// Errors surfaced while processing a message.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The payload or envelope violates its contract. The message is
    /// rejected without touching the store.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The resource tag does not map to a registered handler.
    #[error("invalid topic resource: {0}")]
    UnknownResource(String),

    /// The message arrived on a topic no action is configured for.
    #[error("invalid topic: {0}")]
    UnknownTopic(String),

    /// A document store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Trait for resource handlers.
///
/// A handler may serve several resource kinds (version/revision tags project
/// into the same list).
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// The resource kinds this handler processes.
    fn resources(&self) -> &'static [Resource];

    /// Apply a create message.
    async fn create(&self, state: &AppState, payload: Value) -> HandlerResult;

    /// Apply an update message.
    async fn update(&self, state: &AppState, payload: Value) -> HandlerResult;

    /// Apply a delete message.
    async fn delete(&self, state: &AppState, payload: Value) -> HandlerResult;
}

/// Registry of all resource handlers.
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn ResourceHandler>>,
}

impl HandlerRegistry {
    /// Create a new registry with all standard handlers.
    pub fn new() -> Self {
        Self {
            handlers: vec![
                Box::new(ProjectHandler),
                Box::new(TimelineHandler),
                Box::new(CustomerPaymentHandler),
                Box::new(MemberHandler),
                Box::new(InviteHandler),
                Box::new(NestedHandler::new(nested::ATTACHMENTS)),
                Box::new(NestedHandler::new(nested::PHASES)),
                Box::new(NestedHandler::new(nested::PHASE_PRODUCTS)),
                Box::new(NestedHandler::new(nested::MILESTONES)),
                Box::new(NestedHandler::new(nested::MILESTONE_TEMPLATES)),
                Box::new(NestedHandler::new(nested::PROJECT_TEMPLATES)),
                Box::new(NestedHandler::new(nested::PROJECT_TYPES)),
                Box::new(NestedHandler::new(nested::ORG_CONFIGS)),
                Box::new(NestedHandler::new(nested::FORMS)),
                Box::new(NestedHandler::new(nested::PLAN_CONFIGS)),
                Box::new(NestedHandler::new(nested::PRICE_CONFIGS)),
                Box::new(NestedHandler::new(nested::PRODUCT_TEMPLATES)),
                Box::new(NestedHandler::new(nested::PRODUCT_CATEGORIES)),
            ],
        }
    }

    /// Get the handler for a resource kind.
    pub fn handler_for(&self, resource: Resource) -> Option<&dyn ResourceHandler> {
        self.handlers
            .iter()
            .find(|h| h.resources().contains(&resource))
            .map(|h| h.as_ref())
    }

    /// Get all handlers.
    pub fn handlers(&self) -> &[Box<dyn ResourceHandler>] {
        &self.handlers
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
