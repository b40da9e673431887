//! Client side of the `/chat` endpoint.

use crate::reply::StructuredReply;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Anything that prevented a `/chat` round trip from yielding a reply.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to chat server failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("chat server responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("chat server response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
}

/// The backend a `TurnDispatcher` sends user messages to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, message: String) -> Result<StructuredReply, TransportError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// `ChatBackend` that talks to a running `parle-api` over HTTP.
pub struct HttpChatBackend {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpChatBackend {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Request)?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat", server_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, message: String) -> Result<StructuredReply, TransportError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ChatRequest { message: &message })
            .send()
            .await
            .map_err(TransportError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }
        response.json().await.map_err(TransportError::Decode)
    }
}
