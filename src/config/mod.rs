use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub stream: StreamConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the forum backend API
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket URL of the notification stream
    pub url: String,
    /// Delay between reconnect attempts in milliseconds
    pub reconnect_interval_ms: u64,
    /// Attempt ceiling before the connection is considered failed
    pub max_reconnect_attempts: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:4000/ws/notifications".to_string(),
            reconnect_interval_ms: 3_000,
            max_reconnect_attempts: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            api: ApiConfig {
                base_url: std::env::var("NOTIFY_API_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:4000".to_string()),
            },
            stream: StreamConfig {
                url: std::env::var("NOTIFY_STREAM_URL")
                    .unwrap_or_else(|_| "ws://localhost:4000/ws/notifications".to_string()),
                reconnect_interval_ms: parse_env("NOTIFY_RECONNECT_INTERVAL_MS", 3_000)?,
                max_reconnect_attempts: parse_env("NOTIFY_MAX_RECONNECT_ATTEMPTS", 5)?,
            },
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("invalid value for {}: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
