//! Client configuration
//!
//! Endpoints and timing knobs for the game-play client. Values come from
//! three layers, later layers winning: built-in defaults, an optional JSON
//! config file, and `AULACHESS_*` environment variables.
//!
//! # Environment variables
//!
//! - `AULACHESS_WS_URL` - WebSocket endpoint of the game server
//! - `AULACHESS_API_URL` - Base URL of the platform HTTP API
//! - `AULACHESS_AI_URL` - Endpoint returning engine replies
//! - `AULACHESS_DIFFICULTY` - Engine difficulty label (easy/medium/hard)

use crate::core::error::{CoreError, CoreResult};
use crate::game::ai::AI_REPLY_TIMEOUT;
use crate::networking::client::DEFAULT_RECONNECT_DELAY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

fn default_ws_url() -> String {
    "ws://127.0.0.1:5000/ws".to_string()
}

fn default_api_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_ai_url() -> String {
    "http://127.0.0.1:3000/ai/move".to_string()
}

fn default_difficulty() -> String {
    "medium".to_string()
}

fn default_reconnect_delay_secs() -> u64 {
    DEFAULT_RECONNECT_DELAY.as_secs()
}

fn default_ai_timeout_secs() -> u64 {
    AI_REPLY_TIMEOUT.as_secs()
}

/// Runtime configuration for the game-play client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket endpoint of the game server
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Base URL of the platform HTTP API (game archival, auth)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Endpoint that returns engine replies for vs-AI games
    #[serde(default = "default_ai_url")]
    pub ai_url: String,

    /// Engine difficulty label sent with AI requests
    #[serde(default = "default_difficulty")]
    pub difficulty: String,

    /// Delay between reconnection attempts after an unexpected close
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Hard timeout on a single engine reply request
    #[serde(default = "default_ai_timeout_secs")]
    pub ai_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            api_url: default_api_url(),
            ai_url: default_ai_url(),
            difficulty: default_difficulty(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            ai_timeout_secs: default_ai_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults. A missing file is an
    /// error; callers that want a silent fallback use [`ClientConfig::load_or_default`].
    pub fn load(path: &Path) -> CoreResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file if present, otherwise defaults, then apply
    /// environment overrides
    pub fn load_or_default(path: &Path) -> Self {
        let mut config = if path.exists() {
            match Self::load(path) {
                Ok(config) => {
                    info!("[CONFIG] Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("[CONFIG] Failed to load {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };
        config.apply_env();
        config
    }

    /// Build a configuration from defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("AULACHESS_WS_URL") {
            self.ws_url = url;
        }
        if let Ok(url) = std::env::var("AULACHESS_API_URL") {
            self.api_url = url;
        }
        if let Ok(url) = std::env::var("AULACHESS_AI_URL") {
            self.ai_url = url;
        }
        if let Ok(difficulty) = std::env::var("AULACHESS_DIFFICULTY") {
            self.difficulty = difficulty;
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if !self.ws_url.starts_with("ws://") && !self.ws_url.starts_with("wss://") {
            return Err(CoreError::InvalidConfig {
                message: format!("ws_url must be a ws:// or wss:// URL, got {}", self.ws_url),
            });
        }
        if self.ai_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig {
                message: "ai_timeout_secs must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Delay between reconnection attempts
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Hard timeout for engine reply requests
    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.ws_url.starts_with("ws://"));
        assert_eq!(config.reconnect_delay(), Duration::from_secs(3));
        assert_eq!(config.ai_timeout(), Duration::from_secs(10));
        assert_eq!(config.difficulty, "medium");
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"ws_url": "wss://play.example.org/ws"}"#).unwrap();
        assert_eq!(config.ws_url, "wss://play.example.org/ws");
        assert_eq!(config.api_url, default_api_url());
        assert_eq!(config.ai_timeout_secs, 10);
    }

    #[test]
    fn test_validate_rejects_non_ws_url() {
        let config = ClientConfig {
            ws_url: "http://127.0.0.1:5000".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = ClientConfig::load(Path::new("/nonexistent/client.json"));
        assert!(err.is_err());
    }
}
