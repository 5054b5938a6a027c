//! projview indexer
//!
//! The indexer consumes domain-change messages from the queue and projects
//! them into denormalized, read-optimized documents in the search store.

use std::sync::Arc;

use anyhow::Result;
use projview_indexer::{
    bus::HttpQueueSource,
    config,
    health,
    members::MemberApiClient,
    processor::Processor,
    state::AppState,
    store::SearchStore,
    worker::{ConsumeWorker, WorkerConfig},
};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to PROJVIEW_LOG_LEVEL)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting projview indexer");
    info!(listen_addr = %config.listen_addr, store_url = %config.store.base_url, "Configuration loaded");

    // Build clients
    let store = match SearchStore::new(config.store.clone()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, "Failed to build store client");
            return Err(e.into());
        }
    };
    let members = Arc::new(MemberApiClient::new(config.members.clone())?);

    // Create application state
    let state = AppState::new(store, members, config.store.metadata_doc_id.clone());

    // Create shutdown channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start the consume worker in background
    let topics = config.topics.all().map(String::from).to_vec();
    let source = HttpQueueSource::new(config.queue.clone(), topics)?;
    let processor = Processor::new(state.clone(), config.originator.clone(), config.topics.clone());
    let worker = ConsumeWorker::new(source, processor, WorkerConfig::default());
    let worker_handle = tokio::spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move {
            worker.run(shutdown_rx).await;
        }
    });

    // Serve the health endpoints
    let app = health::routes().with_state(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Health server failed");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    let _ = worker_handle.await;
    server_handle.abort();

    info!("Indexer stopped");
    Ok(())
}
