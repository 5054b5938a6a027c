//! Queue source seam.
//!
//! The message bus itself (brokers, consumer groups, partition assignment)
//! is an external collaborator. This module defines the `MessageSource`
//! trait the worker drives, plus an implementation that tails messages from
//! a queue bridge over HTTP and commits offsets back to it.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Queue source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request could not be sent.
    #[error("queue request failed: {0}")]
    Http(String),

    /// The bridge answered with an unexpected status.
    #[error("unexpected queue response: status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("queue response decode failed: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Http(err.to_string())
    }
}

/// One message as delivered by the queue.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Topic the message was consumed from.
    pub topic: String,

    /// Partition within the topic.
    pub partition: i32,

    /// Offset within the partition.
    pub offset: i64,

    /// Raw message body.
    pub body: Vec<u8>,
}

/// A stream of inbound messages with manual offset commit.
#[async_trait]
pub trait MessageSource: Send {
    /// Fetch the next batch of messages. An empty batch means the stream is
    /// currently drained.
    async fn poll(&mut self) -> Result<Vec<InboundMessage>, SourceError>;

    /// Acknowledge a message so it is not delivered again.
    async fn commit(&mut self, message: &InboundMessage) -> Result<(), SourceError>;
}

/// Queue source configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue bridge base URL.
    pub base_url: String,

    /// Consumer group id.
    pub group_id: String,

    /// Max messages to fetch per poll.
    pub fetch_limit: i64,

    /// Poll interval when no messages are available.
    pub poll_interval: Duration,
}

impl QueueConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("PROJVIEW_QUEUE_URL")
            .unwrap_or_else(|_| "http://localhost:8082".to_string());

        let group_id = std::env::var("PROJVIEW_QUEUE_GROUP_ID")
            .unwrap_or_else(|_| "projview-indexer".to_string());

        let fetch_limit: i64 = std::env::var("PROJVIEW_QUEUE_FETCH_LIMIT")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("PROJVIEW_QUEUE_FETCH_LIMIT must be an integer.")?
            .unwrap_or(100)
            .clamp(1, 500);

        let poll_interval_ms: u64 = std::env::var("PROJVIEW_QUEUE_POLL_INTERVAL_MS")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("PROJVIEW_QUEUE_POLL_INTERVAL_MS must be an integer (milliseconds).")?
            .unwrap_or(1000);
        let poll_interval = Duration::from_millis(poll_interval_ms.max(50));

        Ok(Self {
            base_url,
            group_id,
            fetch_limit,
            poll_interval,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ConsumeResponse {
    items: Vec<ConsumeItem>,
}

#[derive(Debug, Deserialize)]
struct ConsumeItem {
    topic: String,
    partition: i32,
    offset: i64,
    message: serde_json::Value,
}

/// Message source backed by a queue bridge's HTTP API.
pub struct HttpQueueSource {
    client: reqwest::Client,
    config: QueueConfig,
    topics: Vec<String>,
}

impl HttpQueueSource {
    /// Create a new source subscribed to `topics`.
    pub fn new(config: QueueConfig, topics: Vec<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(Self {
            client,
            config,
            topics,
        })
    }
}

#[async_trait]
impl MessageSource for HttpQueueSource {
    async fn poll(&mut self) -> Result<Vec<InboundMessage>, SourceError> {
        let url = format!("{}/consume", self.config.base_url);
        let mut query: Vec<(&str, String)> = vec![
            ("group", self.config.group_id.clone()),
            ("limit", self.config.fetch_limit.to_string()),
        ];
        for topic in &self.topics {
            query.push(("topic", topic.clone()));
        }

        let response = self.client.get(&url).query(&query).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::UnexpectedStatus { status, body });
        }

        let batch: ConsumeResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        debug!(count = batch.items.len(), "Polled queue bridge");
        batch
            .items
            .into_iter()
            .map(|item| {
                let body = serde_json::to_vec(&item.message)
                    .map_err(|e| SourceError::Decode(e.to_string()))?;
                Ok(InboundMessage {
                    topic: item.topic,
                    partition: item.partition,
                    offset: item.offset,
                    body,
                })
            })
            .collect()
    }

    async fn commit(&mut self, message: &InboundMessage) -> Result<(), SourceError> {
        let url = format!("{}/commit", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "group": self.config.group_id,
                "topic": message.topic,
                "partition": message.partition,
                "offset": message.offset,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::UnexpectedStatus { status, body });
        }
        Ok(())
    }
}
