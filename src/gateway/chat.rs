//! Chat transport — posts a turn to the gateway's `/agent/chat` endpoint.
//!
//! Each outbound request carries the full conversation history plus the
//! serialized tool manifest so the remote model knows which capabilities
//! the client advertises. The transport is a trait so sessions can be
//! driven by a scripted implementation in tests.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GatewayConfig;
use crate::message::WireMessage;

/// One turn's outbound request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Manifest: `{ name: { "description": ..., "jsonSchema": ... } }`.
    pub tools: serde_json::Value,
    pub messages: Vec<WireMessage>,
}

/// The gateway's reply: the assistant message for this round.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: WireMessage,
}

/// Sends one chat round to the gateway.
///
/// Implementations make exactly one attempt; retrying is the caller's
/// decision (the session never retries).
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Reqwest-backed transport for the `/agent/chat` endpoint.
pub struct HttpChatTransport {
    client: Client,
    url: String,
    timeout: std::time::Duration,
}

impl HttpChatTransport {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.endpoint("/agent/chat"),
            timeout: config.request_timeout(),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        debug!(
            "Posting chat round: {} messages, {} tools",
            request.messages.len(),
            request
                .tools
                .as_object()
                .map(|m| m.len())
                .unwrap_or_default()
        );

        let send = self.client.post(&self.url).json(request).send();
        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "gateway request timed out after {}s",
                    self.timeout.as_secs()
                )
            })??;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("gateway error ({status}): {body}");
        }

        let chat_response: ChatResponse = response.json().await?;
        Ok(chat_response)
    }
}
