//! Access to the authoritative game server.

use async_trait::async_trait;
use beast_schema::{GameState, SyncResponse};
use reqwest::Method;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::trace;

use crate::config::ServerConfig;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid server address '{0}'")]
    InvalidBaseUrl(String),
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} responded with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The operations the spectator needs from the game server.
#[async_trait]
pub trait GameServer: Send + Sync + 'static {
    /// Latest snapshot, flagged with whether it differs from the previous one.
    async fn fetch_update(&self) -> Result<SyncResponse, SyncError>;

    /// Start a fresh game and return its first snapshot.
    async fn reset(&self) -> Result<GameState, SyncError>;

    /// Current snapshot without advancing the simulation.
    async fn current_state(&self) -> Result<GameState, SyncError>;
}

/// JSON-over-HTTP game server client (`GET /update`, `POST /reset`, `GET /state`).
#[derive(Debug, Clone)]
pub struct HttpGameServer {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpGameServer {
    pub fn new(config: &ServerConfig) -> Result<Self, SyncError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(SyncError::InvalidBaseUrl(config.base_url.clone()));
        }
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(SyncError::Client)?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn request<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T, SyncError> {
        let endpoint = self.endpoint(path);
        let response = self
            .http_client
            .request(method, &endpoint)
            .send()
            .await
            .map_err(|source| SyncError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| SyncError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        trace!(
            target: "beast_spectator::server",
            endpoint = %endpoint,
            bytes = body.len(),
            "server.response"
        );
        serde_json::from_slice(&body).map_err(|source| SyncError::Decode { endpoint, source })
    }
}

#[async_trait]
impl GameServer for HttpGameServer {
    async fn fetch_update(&self) -> Result<SyncResponse, SyncError> {
        self.request(Method::GET, "update").await
    }

    async fn reset(&self) -> Result<GameState, SyncError> {
        self.request(Method::POST, "reset").await
    }

    async fn current_state(&self) -> Result<GameState, SyncError> {
        self.request(Method::GET, "state").await
    }
}
