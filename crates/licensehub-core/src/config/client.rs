//! Client license manager configuration.

use serde::{Deserialize, Serialize};

/// Settings for the client-side license manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base endpoint of the activation service. A trailing slash is trimmed.
    #[serde(default = "default_server_endpoint")]
    pub server_endpoint: String,
    /// Interval between heartbeats for concurrent licenses, in seconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Timeout for online validation/heartbeat/disconnect requests, in
    /// seconds. Defaults to the heartbeat interval when absent.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
    /// Whether built-in per-variant validation rules run during load.
    #[serde(default = "default_built_in_validation")]
    pub built_in_validation: bool,
}

impl ClientConfig {
    /// Base endpoint with any trailing slash removed.
    pub fn endpoint(&self) -> &str {
        self.server_endpoint.trim_end_matches('/')
    }

    /// Effective request timeout in seconds.
    pub fn request_timeout(&self) -> u64 {
        self.request_timeout_seconds
            .unwrap_or(self.heartbeat_interval_seconds)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_endpoint: default_server_endpoint(),
            heartbeat_interval_seconds: default_heartbeat_interval(),
            request_timeout_seconds: None,
            built_in_validation: default_built_in_validation(),
        }
    }
}

fn default_server_endpoint() -> String {
    "http://localhost:8080/api/licenses".to_string()
}

fn default_heartbeat_interval() -> u64 {
    300
}

fn default_built_in_validation() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = ClientConfig {
            server_endpoint: "https://licenses.example.com/api/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(config.endpoint(), "https://licenses.example.com/api");
    }

    #[test]
    fn request_timeout_defaults_to_heartbeat_interval() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout(), config.heartbeat_interval_seconds);
    }
}
