//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `8081`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `WALLET_SERVICE_URL` — wallet API base (default: `"http://localhost:8082"`)
/// - `USER_SERVICE_URL` — user API base (default: `"http://localhost:8080"`)
/// - `CATALOG_PATH` — product catalog file (default: `"products.json"`)
/// - `REPLY_TIMEOUT_SECS` — per-phase entity reply timeout (default: `5`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub wallet_service_url: String,
    pub user_service_url: String,
    pub catalog_path: String,
    pub reply_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8081),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            wallet_service_url: std::env::var("WALLET_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8082".to_string()),
            user_service_url: std::env::var("USER_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            catalog_path: std::env::var("CATALOG_PATH")
                .unwrap_or_else(|_| "products.json".to_string()),
            reply_timeout: Duration::from_secs(
                std::env::var("REPLY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            log_level: "info".to_string(),
            wallet_service_url: "http://localhost:8082".to_string(),
            user_service_url: "http://localhost:8080".to_string(),
            catalog_path: "products.json".to_string(),
            reply_timeout: Duration::from_secs(5),
        }
    }
}
