//! Connection lifecycle client.
//!
//! Toolkit connections (third-party integration auth) live entirely on the
//! gateway. The client polls and refetches; it never computes a status
//! transition locally.

use anyhow::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::GatewayConfig;

/// Gateway-reported connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Initializing,
    Initiated,
    Active,
    Failed,
    Expired,
    Inactive,
}

/// A toolkit connection as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Connection {
    pub id: String,
    pub status: ConnectionStatus,
    pub toolkit: String,
}

/// Response to a connection initiation request.
///
/// The caller opens `redirect_url` in a browser to complete the auth flow,
/// then refetches the list or waits on the connection id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectionInit {
    pub id: String,
    pub status: ConnectionStatus,
    #[serde(rename = "redirectUrl")]
    pub redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct ConnectionList {
    connections: Vec<Connection>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: ConnectionStatus,
}

/// Client for the gateway's connection endpoints.
pub struct ConnectionClient {
    client: Client,
    base_url: String,
    timeout: std::time::Duration,
}

impl ConnectionClient {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
        }
    }

    /// Lists all connections known to the gateway.
    pub async fn list(&self) -> Result<Vec<Connection>> {
        let url = format!("{}/connections/list", self.base_url);
        let list: ConnectionList = self.get_json(&url).await?;
        Ok(list.connections)
    }

    /// Starts the auth flow for a toolkit; completion happens out of band
    /// via the returned redirect URL.
    pub async fn initiate(&self, toolkit: &str) -> Result<ConnectionInit> {
        let url = format!("{}/connection/init/{toolkit}", self.base_url);
        debug!("Initiating connection for toolkit {toolkit}");
        self.get_json(&url).await
    }

    /// Disconnects a toolkit.
    pub async fn disconnect(&self, toolkit: &str) -> Result<ConnectionStatus> {
        let url = format!("{}/connection/disconnect/{toolkit}", self.base_url);
        debug!("Disconnecting toolkit {toolkit}");
        let response: StatusResponse = self.get_json(&url).await?;
        Ok(response.status)
    }

    /// Long-polls the gateway until the connection settles; returns the
    /// status the gateway reports.
    pub async fn wait(&self, id: &str) -> Result<ConnectionStatus> {
        let url = format!("{}/connection/wait/{id}", self.base_url);
        let response: StatusResponse = self.get_json(&url).await?;
        Ok(response.status)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let send = self.client.get(url).send();
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

#[cfg(test)]
mod tests {
    use super::*;

    // ── Wire parsing ─────────────────────────────────────

    #[test]
    fn test_connection_list_parsing() {
        let json = r#"{
            "connections": [
                {"id": "conn-1", "status": "ACTIVE", "toolkit": "calendar"},
                {"id": "conn-2", "status": "EXPIRED", "toolkit": "mail"}
            ]
        }"#;
        let list: ConnectionList = serde_json::from_str(json).unwrap();
        assert_eq!(list.connections.len(), 2);
        assert_eq!(list.connections[0].status, ConnectionStatus::Active);
        assert_eq!(list.connections[1].toolkit, "mail");
    }

    #[test]
    fn test_connection_init_parsing() {
        let json = r#"{
            "id": "conn-3",
            "status": "INITIATED",
            "redirectUrl": "https://auth.example.com/flow/abc"
        }"#;
        let init: ConnectionInit = serde_json::from_str(json).unwrap();
        assert_eq!(init.status, ConnectionStatus::Initiated);
        assert_eq!(init.redirect_url, "https://auth.example.com/flow/abc");
    }

    #[test]
    fn test_status_response_parsing() {
        let response: StatusResponse = serde_json::from_str(r#"{"status": "INACTIVE"}"#).unwrap();
        assert_eq!(response.status, ConnectionStatus::Inactive);
    }

    #[test]
    fn test_all_statuses_parse() {
        for (wire, expected) in [
            ("INITIALIZING", ConnectionStatus::Initializing),
            ("INITIATED", ConnectionStatus::Initiated),
            ("ACTIVE", ConnectionStatus::Active),
            ("FAILED", ConnectionStatus::Failed),
            ("EXPIRED", ConnectionStatus::Expired),
            ("INACTIVE", ConnectionStatus::Inactive),
        ] {
            let parsed: ConnectionStatus =
                serde_json::from_str(&format!("\"{wire}\"")).unwrap();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        let result: Result<ConnectionStatus, _> = serde_json::from_str("\"DANGLING\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_client_urls_from_config() {
        let config = GatewayConfig {
            base_url: "http://gateway.test:3005/".to_string(),
            ..GatewayConfig::default()
        };
        let client = ConnectionClient::new(&config);
        assert_eq!(client.base_url, "http://gateway.test:3005");
    }
}
