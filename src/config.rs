use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ws_url: String,
    pub heartbeat_threshold_ms: u64,
    pub liveness_poll_ms: u64,
    pub default_cooldown_secs: u32,
    pub feedback_ttl_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ws_url: "ws://localhost:8000/ws/control/".to_string(),
            heartbeat_threshold_ms: 10_000,
            liveness_poll_ms: 1_000,
            default_cooldown_secs: 3,
            feedback_ttl_ms: 3_000,
        }
    }
}

pub fn load_config() -> Config {
    let mut cfg = match fs::read_to_string("config.toml") {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse config.toml: {e}, using defaults");
            Config::default()
        }),
        Err(_) => {
            tracing::info!("No config.toml found, using defaults");
            Config::default()
        }
    };

    // Environment wins over the file, same as the mobile app's endpoint var
    if let Ok(url) = std::env::var("DESKLINK_WS_URL") {
        cfg.ws_url = url;
    }

    cfg
}
