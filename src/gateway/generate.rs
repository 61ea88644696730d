//! Single-shot generation endpoints.
//!
//! For one-off generations where chat history and tool flows are not
//! needed — captioning, summarizing, extracting structured data:
//! - `POST {base}/text/llm` with `{ messages }` → `{ completion }`
//! - `POST {base}/llm/object` with `{ messages, schema }` → `{ object }`
//!
//! Generated objects are validated by deserializing into the caller's
//! type; a shape mismatch is a fail-fast error.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::message::Role;

// ── Request message types ────────────────────────────────

/// A content part within a multi-part generation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
    /// Base64 data or a URL, passed through to the gateway untouched.
    Image { image: String },
}

/// Message content: plain text or an ordered part sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A message for the generation endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }
}

// ── Wire types ───────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TextRequest<'a> {
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    completion: String,
}

#[derive(Debug, Serialize)]
struct ObjectRequest<'a> {
    messages: &'a [Message],
    schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    object: Value,
}

// ── GenerationClient ─────────────────────────────────────

/// Client for the single-shot text/object generation endpoints.
pub struct GenerationClient {
    client: Client,
    base_url: String,
    timeout: std::time::Duration,
}

impl GenerationClient {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
        }
    }

    /// Generates free text from a message list.
    pub async fn generate_text(&self, messages: &[Message]) -> Result<String> {
        let url = format!("{}/text/llm", self.base_url);
        debug!("Generating text from {} messages", messages.len());
        let response: TextResponse = self.post_json(&url, &TextRequest { messages }).await?;
        Ok(response.completion)
    }

    /// Generates free text from a bare prompt, wrapped as one user message.
    pub async fn generate_text_from(&self, prompt: &str) -> Result<String> {
        self.generate_text(&[Message::user(prompt)]).await
    }

    /// Generates a structured object matching `schema` and deserializes it
    /// into `T`. Fails fast when the generated object does not fit `T`.
    pub async fn generate_object<T: DeserializeOwned>(
        &self,
        messages: &[Message],
        schema: &Value,
    ) -> Result<T> {
        let url = format!("{}/llm/object", self.base_url);
        debug!("Generating object from {} messages", messages.len());
        let response: ObjectResponse = self
            .post_json(&url, &ObjectRequest { messages, schema })
            .await?;
        parse_object(response.object)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let send = self.client.post(url).json(body).send();
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

        Ok(response.json().await?)
    }
}

/// Validates a generated object by typed deserialization.
fn parse_object<T: DeserializeOwned>(object: Value) -> Result<T> {
    serde_json::from_value(object).context("generated object does not match the requested schema")
}
