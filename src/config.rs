use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Gateway endpoint settings.
///
/// Injected into each client constructor — there is no ambient global.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Base URL of the toolkit gateway. Supports ${ENV_VAR} substitution.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request deadline; an elapsed deadline fails the turn.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Upper bound on automatic tool-call continuation rounds per turn.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,
}

fn default_base_url() -> String {
    "http://localhost:3005".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_tool_rounds() -> u32 {
    8
}

fn default_agent_name() -> String {
    "Toolkit Agent".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
        }
    }
}

impl GatewayConfig {
    /// Absolute URL for a gateway path, e.g. `endpoint("/agent/chat")`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// The per-request deadline as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {path}"))?;
        Self::parse(&content)
    }

    /// Parses TOML content, expanding ${ENV_VAR} references first.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let expanded = shellexpand::env(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Url::parse(&config.gateway.base_url)
            .with_context(|| format!("invalid gateway.base_url: {}", config.gateway.base_url))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ─────────────────────────────────────────

    #[test]
    fn test_defaults_from_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.gateway.base_url, "http://localhost:3005");
        assert_eq!(config.gateway.request_timeout_secs, 120);
        assert_eq!(config.gateway.max_tool_rounds, 8);
        assert_eq!(config.agent.name, "Toolkit Agent");
    }

    #[test]
    fn test_partial_override() {
        let config = Config::parse(
            r#"
            [gateway]
            base_url = "https://toolkit.example.com"

            [agent]
            name = "Demo"
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.base_url, "https://toolkit.example.com");
        // Untouched fields keep their defaults
        assert_eq!(config.gateway.request_timeout_secs, 120);
        assert_eq!(config.agent.name, "Demo");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = Config::parse(
            r#"
            [gateway]
            base_url = "not a url"
            "#,
        );
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("invalid gateway.base_url"));
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("TOOLKIT_AGENT_TEST_URL", "http://gateway.test:3005");
        let config = Config::parse(
            r#"
            [gateway]
            base_url = "${TOOLKIT_AGENT_TEST_URL}"
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.base_url, "http://gateway.test:3005");
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let result = Config::parse(
            r#"
            [gateway]
            base_url = "${TOOLKIT_AGENT_TEST_UNSET}"
            "#,
        );
        assert!(result.is_err());
    }

    // ── endpoint() ───────────────────────────────────────

    #[test]
    fn test_endpoint_joins_path() {
        let gateway = GatewayConfig::default();
        assert_eq!(
            gateway.endpoint("/agent/chat"),
            "http://localhost:3005/agent/chat"
        );
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let gateway = GatewayConfig {
            base_url: "http://gateway.test:3005/".to_string(),
            ..GatewayConfig::default()
        };
        assert_eq!(
            gateway.endpoint("/connections/list"),
            "http://gateway.test:3005/connections/list"
        );
    }

    #[test]
    fn test_request_timeout() {
        let gateway = GatewayConfig {
            request_timeout_secs: 5,
            ..GatewayConfig::default()
        };
        assert_eq!(gateway.request_timeout(), Duration::from_secs(5));
    }
}
