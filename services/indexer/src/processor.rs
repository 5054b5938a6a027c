//! Message dispatcher.
//!
//! Validates the envelope of every inbound message and routes its payload to
//! the handler registered for the payload's resource tag. The action
//! (create/update/delete) is determined by the topic the message arrived on.

use projview_events::{Action, MessageEnvelope, Resource};
use tracing::debug;

use crate::handlers::{HandlerRegistry, ProcessError};
use crate::state::AppState;

/// The topic names the projector consumes, one per action.
#[derive(Debug, Clone)]
pub struct TopicSet {
    pub create: String,
    pub update: String,
    pub delete: String,
}

impl TopicSet {
    /// All topics to subscribe to.
    pub fn all(&self) -> [&str; 3] {
        [&self.create, &self.update, &self.delete]
    }

    fn action_for(&self, topic: &str) -> Option<Action> {
        if topic == self.create {
            Some(Action::Create)
        } else if topic == self.update {
            Some(Action::Update)
        } else if topic == self.delete {
            Some(Action::Delete)
        } else {
            None
        }
    }
}

impl Default for TopicSet {
    fn default() -> Self {
        Self {
            create: projview_events::topics::CREATE.to_string(),
            update: projview_events::topics::UPDATE.to_string(),
            delete: projview_events::topics::DELETE.to_string(),
        }
    }
}

/// Routes inbound messages to resource handlers.
pub struct Processor {
    state: AppState,
    registry: HandlerRegistry,
    originator: String,
    topics: TopicSet,
}

impl Processor {
    /// Create a new processor with the standard handler registry.
    pub fn new(state: AppState, originator: String, topics: TopicSet) -> Self {
        Self {
            state,
            registry: HandlerRegistry::new(),
            originator,
            topics,
        }
    }

    /// Validate and apply one raw message.
    ///
    /// A malformed or mis-addressed envelope is a `Validation` error and no
    /// store mutation happens; an unrecognized resource tag or topic is its
    /// own error class so callers can tell configuration drift from producer
    /// bugs.
    pub async fn process(&self, transport_topic: &str, raw: &[u8]) -> Result<(), ProcessError> {
        let envelope = MessageEnvelope::from_slice(raw)
            .map_err(|e| ProcessError::Validation(e.to_string()))?;
        envelope
            .verify(transport_topic, &self.originator)
            .map_err(|e| ProcessError::Validation(e.to_string()))?;

        let action = self
            .topics
            .action_for(transport_topic)
            .ok_or_else(|| ProcessError::UnknownTopic(transport_topic.to_string()))?;

        // verify() guarantees the tag is present
        let tag = envelope.resource_tag().unwrap_or_default().to_string();
        let resource = Resource::from_tag(&tag)
            .map_err(|_| ProcessError::UnknownResource(tag.clone()))?;
        let handler = self
            .registry
            .handler_for(resource)
            .ok_or(ProcessError::UnknownResource(tag))?;

        debug!(%resource, %action, "Dispatching message");
        let payload = envelope.payload_fields();
        match action {
            Action::Create => handler.create(&self.state, payload).await,
            Action::Update => handler.update(&self.state, payload).await,
            Action::Delete => handler.delete(&self.state, payload).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::members::{LookupError, MemberLookup, MemberProfile};
    use crate::store::MemoryStore;

    use super::*;

    struct NoLookup;

    #[async_trait::async_trait]
    impl MemberLookup for NoLookup {
        async fn member_details(&self, _: &[i64]) -> Result<Vec<MemberProfile>, LookupError> {
            Ok(Vec::new())
        }
    }

    fn processor() -> Processor {
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(NoLookup),
            "1".to_string(),
        );
        Processor::new(state, "project-api".to_string(), TopicSet::default())
    }

    fn message(resource: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "topic": "project.action.create",
            "originator": "project-api",
            "timestamp": 1561075200000i64,
            "mime-type": "application/json",
            "payload": { "resource": resource, "key": "generic", "displayName": "Generic" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_process_rejects_invalid_json() {
        let processor = processor();
        let err = processor
            .process("project.action.create", b"not json")
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Validation(_)));
    }

    #[tokio::test]
    async fn test_process_rejects_wrong_originator() {
        let processor = processor();
        let raw = serde_json::to_vec(&json!({
            "topic": "project.action.create",
            "originator": "intruder",
            "timestamp": 0,
            "mime-type": "application/json",
            "payload": { "resource": "project.type" }
        }))
        .unwrap();
        let err = processor
            .process("project.action.create", &raw)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Validation(_)));
    }

    #[tokio::test]
    async fn test_process_rejects_unknown_resource() {
        let processor = processor();
        let err = processor
            .process("project.action.create", &message("project.unknown"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_process_rejects_unknown_topic() {
        let processor = processor();
        let raw = serde_json::to_vec(&json!({
            "topic": "project.action.archive",
            "originator": "project-api",
            "timestamp": 0,
            "mime-type": "application/json",
            "payload": { "resource": "project.type", "key": "k" }
        }))
        .unwrap();
        let err = processor
            .process("project.action.archive", &raw)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::UnknownTopic(_)));
    }

    #[tokio::test]
    async fn test_process_applies_a_valid_message() {
        let processor = processor();
        processor
            .process("project.action.create", &message("project.type"))
            .await
            .unwrap();
    }
}
