use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub websocket: WebSocketConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    /// Interval between protocol-level pings sent to each client.
    pub heartbeat_interval_secs: u64,
    /// A client silent for longer than this is disconnected.
    pub client_timeout_secs: u64,
}

impl WebSocketConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL missing".into()))?;

        Ok(Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3000),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            },
            websocket: WebSocketConfig {
                heartbeat_interval_secs: env::var("WS_HEARTBEAT_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
                client_timeout_secs: env::var("WS_CLIENT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            },
        })
    }

    /// Defaults for tests and local tooling; no environment reads.
    pub fn test_defaults() -> Self {
        Config {
            app: AppConfig {
                env: "test".into(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/helpdesk_test".into(),
                max_connections: 5,
            },
            websocket: WebSocketConfig {
                heartbeat_interval_secs: 5,
                client_timeout_secs: 30,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let cfg = Config::test_defaults();
        assert_eq!(cfg.app.port, 3000);
        assert!(cfg.database.max_connections > 0);
        assert!(cfg.websocket.client_timeout_secs > cfg.websocket.heartbeat_interval_secs);
    }

    #[test]
    fn duration_helpers() {
        let cfg = Config::test_defaults();
        assert_eq!(cfg.websocket.heartbeat_interval(), Duration::from_secs(5));
        assert_eq!(cfg.websocket.client_timeout(), Duration::from_secs(30));
    }
}
