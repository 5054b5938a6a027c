//! Background consume worker.
//!
//! The worker continuously polls the queue source and applies messages to
//! the store. It runs in a loop:
//! 1. Poll the source for a batch of messages
//! 2. Process each message to completion through the dispatcher
//! 3. Commit the offset, whether processing succeeded or not
//! 4. Sleep if no messages were available, then repeat
//!
//! Committing unconditionally makes processing at-most-once effective: a
//! failed message is logged and never redelivered, so one poison message
//! cannot block the stream.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::bus::MessageSource;
use crate::processor::Processor;

/// Configuration for the consume worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How long to sleep after a drained poll or a poll error.
    pub poll_interval: Duration,

    /// How often to log progress (in messages processed).
    pub log_interval: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            log_interval: 1000,
        }
    }
}

/// Background worker that drains the queue source into the store.
pub struct ConsumeWorker<S: MessageSource> {
    source: S,
    processor: Processor,
    config: WorkerConfig,
}

impl<S: MessageSource> ConsumeWorker<S> {
    /// Create a new consume worker.
    pub fn new(source: S, processor: Processor, config: WorkerConfig) -> Self {
        Self {
            source,
            processor,
            config,
        }
    }

    /// Run the worker until the shutdown signal is received.
    #[instrument(skip(self, shutdown), name = "consume_worker")]
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting consume worker");

        let mut processed: u64 = 0;
        let mut last_log_count: u64 = 0;

        loop {
            if *shutdown.borrow() {
                info!(processed, "Shutdown signal received, stopping consume worker");
                break;
            }

            let batch = match self.source.poll().await {
                Ok(batch) => batch,
                Err(err) => {
                    // Poll failures are transient transport trouble, not
                    // message failures; back off and try again.
                    warn!(error = %err, "Queue poll failed");
                    tokio::select! {
                        _ = shutdown.changed() => {}
                        _ = sleep(self.config.poll_interval) => {}
                    }
                    continue;
                }
            };

            if batch.is_empty() {
                tokio::select! {
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            info!("Shutdown signal received during poll wait");
                            break;
                        }
                    }
                    _ = sleep(self.config.poll_interval) => {}
                }
                continue;
            }

            for message in batch {
                info!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    "Handling queue message"
                );

                if let Err(err) = self.processor.process(&message.topic, &message.body).await {
                    error!(
                        error = %err,
                        topic = %message.topic,
                        offset = message.offset,
                        "Failed to process message"
                    );
                }

                // Commit regardless of the processing outcome.
                if let Err(err) = self.source.commit(&message).await {
                    error!(
                        error = %err,
                        topic = %message.topic,
                        offset = message.offset,
                        "Failed to commit offset"
                    );
                }

                processed += 1;
                if processed - last_log_count >= self.config.log_interval {
                    info!(processed, "Consume worker progress");
                    last_log_count = processed;
                }
            }
        }

        info!(processed, "Consume worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_config_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.log_interval, 1000);
    }
}
