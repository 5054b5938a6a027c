use std::net::SocketAddr;

use anyhow::Result;

use projview_events::topics;

use crate::bus::QueueConfig;
use crate::members::MemberApiConfig;
use crate::processor::TopicSet;
use crate::store::StoreConfig;

/// Indexer configuration (env-driven).
#[derive(Debug, Clone)]
pub struct Config {
    /// Address for the health endpoints.
    pub listen_addr: SocketAddr,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Expected message originator; messages from anyone else are rejected.
    pub originator: String,

    /// Topic names, one per action.
    pub topics: TopicSet,

    /// Queue source configuration.
    pub queue: QueueConfig,

    /// Document store configuration.
    pub store: StoreConfig,

    /// Member lookup service configuration.
    pub members: MemberApiConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("PROJVIEW_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()?;

        let log_level = std::env::var("PROJVIEW_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let originator =
            std::env::var("PROJVIEW_ORIGINATOR").unwrap_or_else(|_| "project-api".to_string());

        let topic_set = TopicSet {
            create: std::env::var("PROJVIEW_CREATE_TOPIC")
                .unwrap_or_else(|_| topics::CREATE.to_string()),
            update: std::env::var("PROJVIEW_UPDATE_TOPIC")
                .unwrap_or_else(|_| topics::UPDATE.to_string()),
            delete: std::env::var("PROJVIEW_DELETE_TOPIC")
                .unwrap_or_else(|_| topics::DELETE.to_string()),
        };

        let queue = QueueConfig::from_env()?;
        let store = StoreConfig::from_env();
        let members = MemberApiConfig::from_env();

        Ok(Self {
            listen_addr,
            log_level,
            originator,
            topics: topic_set,
            queue,
            store,
            members,
        })
    }
}
