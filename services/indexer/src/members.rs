//! Member lookup service client.
//!
//! Resolves user ids to member profiles so that member documents carry
//! handle and name fields alongside the raw payload. The service requires a
//! bearer token obtained through a machine-credential exchange; tokens are
//! cached until shortly before expiry.
//!
//! Lookup failures are expected operational noise: every caller treats them
//! as non-fatal and indexes the bare payload instead.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Member lookup errors.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The request could not be sent.
    #[error("member service request failed: {0}")]
    Http(String),

    /// The credential exchange failed.
    #[error("auth token exchange failed: {0}")]
    Auth(String),

    /// The service answered with an unexpected status.
    #[error("unexpected member service response: status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("member service response decode failed: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::Http(err.to_string())
    }
}

/// A member profile as returned by the lookup service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub user_id: i64,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Member lookup seam. The HTTP client is the production implementation;
/// tests substitute their own.
#[async_trait]
pub trait MemberLookup: Send + Sync {
    /// Fetch profiles for a list of user ids. Ids with no profile are simply
    /// absent from the result.
    async fn member_details(&self, user_ids: &[i64]) -> Result<Vec<MemberProfile>, LookupError>;
}

/// Member lookup service configuration.
#[derive(Debug, Clone)]
pub struct MemberApiConfig {
    /// Member service base URL.
    pub base_url: String,

    /// Token endpoint for the machine-credential exchange. When unset, the
    /// client sends unauthenticated requests (local development).
    pub auth_url: Option<String>,

    /// Machine credential client id.
    pub client_id: String,

    /// Machine credential client secret.
    pub client_secret: String,

    /// Audience claim for issued tokens.
    pub audience: String,
}

impl MemberApiConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("PROJVIEW_MEMBER_API_URL")
                .unwrap_or_else(|_| "http://localhost:4000/members".to_string()),
            auth_url: std::env::var("PROJVIEW_AUTH_URL").ok(),
            client_id: std::env::var("PROJVIEW_AUTH_CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("PROJVIEW_AUTH_CLIENT_SECRET").unwrap_or_default(),
            audience: std::env::var("PROJVIEW_AUTH_AUDIENCE").unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// HTTP client for the member lookup service.
pub struct MemberApiClient {
    client: reqwest::Client,
    config: MemberApiConfig,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl MemberApiClient {
    /// Create a new member service client.
    pub fn new(config: MemberApiConfig) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| LookupError::Http(e.to_string()))?;

        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    async fn bearer_token(&self) -> Result<Option<String>, LookupError> {
        let Some(auth_url) = &self.config.auth_url else {
            return Ok(None);
        };

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            // Refresh a minute early so in-flight requests never carry an
            // expired token.
            if token.expires_at - chrono::Duration::seconds(60) > Utc::now() {
                return Ok(Some(token.token.clone()));
            }
        }

        debug!("Exchanging machine credentials for a member service token");
        let response = self
            .client
            .post(auth_url)
            .json(&serde_json::json!({
                "grant_type": "client_credentials",
                "client_id": self.config.client_id,
                "client_secret": self.config.client_secret,
                "audience": self.config.audience,
            }))
            .send()
            .await
            .map_err(|e| LookupError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Auth(format!("status {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Auth(e.to_string()))?;

        let entry = CachedToken {
            token: token.access_token.clone(),
            expires_at: Utc::now() + chrono::Duration::seconds(token.expires_in),
        };
        *cached = Some(entry);
        Ok(Some(token.access_token))
    }
}

#[async_trait]
impl MemberLookup for MemberApiClient {
    async fn member_details(&self, user_ids: &[i64]) -> Result<Vec<MemberProfile>, LookupError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = user_ids
            .iter()
            .map(|id| format!("userId:{}", id))
            .collect::<Vec<_>>()
            .join(" OR ");
        let url = format!("{}/_search", self.config.base_url);
        debug!(query = %query, "Fetching member details");

        let mut request = self.client.get(&url).query(&[
            ("query", query.as_str()),
            ("fields", "userId,handle,firstName,lastName,email"),
        ]);
        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::UnexpectedStatus { status, body });
        }

        let profiles: Vec<MemberProfile> = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))?;
        debug!(count = profiles.len(), "Fetched member details");
        Ok(profiles)
    }
}
