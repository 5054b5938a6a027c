//! Consume worker tests: offsets are committed whether or not processing
//! succeeds, and failed messages never block the stream.


use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use harness::{envelope, processor, TOPIC_CREATE};
use projview_indexer::bus::{InboundMessage, MessageSource, SourceError};
use projview_indexer::store::{Collection, DocumentStore};
use projview_indexer::worker::{ConsumeWorker, WorkerConfig};
use serde_json::json;
use tokio::sync::watch;

/// Source that serves scripted batches and records committed offsets.
struct ScriptedSource {
    batches: VecDeque<Vec<InboundMessage>>,
    committed: Arc<Mutex<Vec<i64>>>,
    drained: Arc<Mutex<bool>>,
}

#[async_trait]
impl MessageSource for ScriptedSource {
    async fn poll(&mut self) -> Result<Vec<InboundMessage>, SourceError> {
        match self.batches.pop_front() {
            Some(batch) => Ok(batch),
            None => {
                *self.drained.lock().unwrap() = true;
                Ok(Vec::new())
            }
        }
    }

    async fn commit(&mut self, message: &InboundMessage) -> Result<(), SourceError> {
        self.committed.lock().unwrap().push(message.offset);
        Ok(())
    }
}

fn message(offset: i64, body: Vec<u8>) -> InboundMessage {
    InboundMessage {
        topic: TOPIC_CREATE.to_string(),
        partition: 0,
        offset,
        body,
    }
}

#[tokio::test]
async fn test_worker_commits_failed_messages_and_keeps_going() {
    let (store, processor) = processor();
    store
        .create(Collection::Projects, "1", &json!({"id": 1}))
        .await
        .unwrap();

    let good = envelope(
        TOPIC_CREATE,
        "attachment",
        json!({"id": 7, "projectId": 1, "title": "t", "path": "/a"}),
    );
    let batch = vec![
        message(0, b"not json".to_vec()),
        // valid envelope, but the parent project does not exist
        message(
            1,
            envelope(TOPIC_CREATE, "project.phase", json!({"id": 1, "projectId": 99})),
        ),
        message(2, good),
    ];

    let committed = Arc::new(Mutex::new(Vec::new()));
    let drained = Arc::new(Mutex::new(false));
    let source = ScriptedSource {
        batches: VecDeque::from([batch]),
        committed: committed.clone(),
        drained: drained.clone(),
    };

    let worker = ConsumeWorker::new(
        source,
        processor,
        WorkerConfig {
            poll_interval: Duration::from_millis(10),
            log_interval: 1000,
        },
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    // Wait until the scripted batches are exhausted, then stop the worker.
    for _ in 0..100 {
        if *drained.lock().unwrap() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    // Every offset was committed, failures included.
    assert_eq!(*committed.lock().unwrap(), vec![0, 1, 2]);

    // The good message after the failures still landed.
    let doc = store.get(Collection::Projects, "1").await.unwrap();
    assert_eq!(doc["attachments"][0]["id"], json!(7));
}
