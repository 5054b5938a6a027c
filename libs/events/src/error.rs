//! Error types for message handling.

use thiserror::Error;

/// Errors that can occur when decoding or validating a message envelope.
#[derive(Debug, Error, Clone)]
pub enum EventError {
    /// The message body is not valid JSON or is missing envelope fields.
    #[error("malformed message envelope: {0}")]
    Malformed(String),

    /// The envelope topic does not match the topic the message arrived on.
    #[error("message topic {message_topic} does not match transport topic {transport_topic}")]
    TopicMismatch {
        message_topic: String,
        transport_topic: String,
    },

    /// The envelope originator does not match the configured originator.
    #[error("message originator {actual} does not match expected originator {expected}")]
    OriginatorMismatch { expected: String, actual: String },

    /// The payload is missing the resource tag or it is not a string.
    #[error("payload is missing a string `resource` tag")]
    MissingResource,

    /// The resource tag does not name a known resource kind.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::Serialization(err.to_string())
    }
}
