//! Message envelope - the common wrapper for all inbound messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventError;

/// Message timestamp, either epoch milliseconds or an ISO 8601 date string.
///
/// Producers are inconsistent about which form they emit, so both are
/// accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// An ISO 8601 / RFC 3339 date string.
    DateTime(DateTime<Utc>),
}

impl Timestamp {
    /// Resolve to a concrete UTC datetime.
    ///
    /// Returns `None` for epoch values outside the representable range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::EpochMillis(ms) => DateTime::from_timestamp_millis(ms),
            Timestamp::DateTime(dt) => Some(dt),
        }
    }
}

/// The message envelope - common metadata wrapped around every payload.
///
/// The payload stays an opaque JSON object here; only the `resource` tag is
/// interpreted, by the dispatcher, to select a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// The topic the producer addressed the message to.
    pub topic: String,

    /// The producing system.
    pub originator: String,

    /// When the change occurred.
    pub timestamp: Timestamp,

    /// Payload content type.
    #[serde(rename = "mime-type")]
    pub mime_type: String,

    /// Resource-tagged payload.
    pub payload: Value,
}

impl MessageEnvelope {
    /// Decode an envelope from raw message bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(bytes).map_err(|e| EventError::Malformed(e.to_string()))
    }

    /// Validate the envelope against the transport topic and the configured
    /// originator.
    ///
    /// A message whose inner `topic` disagrees with the topic it arrived on,
    /// or whose `originator` is not the expected producer, is rejected before
    /// any store mutation.
    pub fn verify(&self, transport_topic: &str, expected_originator: &str) -> Result<(), EventError> {
        if self.topic != transport_topic {
            return Err(EventError::TopicMismatch {
                message_topic: self.topic.clone(),
                transport_topic: transport_topic.to_string(),
            });
        }
        if self.originator != expected_originator {
            return Err(EventError::OriginatorMismatch {
                expected: expected_originator.to_string(),
                actual: self.originator.clone(),
            });
        }
        if self.resource_tag().is_err() {
            return Err(EventError::MissingResource);
        }
        Ok(())
    }

    /// The payload's resource tag.
    pub fn resource_tag(&self) -> Result<&str, EventError> {
        self.payload
            .as_object()
            .and_then(|p| p.get("resource"))
            .and_then(Value::as_str)
            .ok_or(EventError::MissingResource)
    }

    /// The payload with the resource tag stripped, ready for a handler.
    pub fn payload_fields(&self) -> Value {
        let mut payload = self.payload.clone();
        if let Some(obj) = payload.as_object_mut() {
            obj.remove("resource");
        }
        payload
    }
}
