use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// Optional JSON topic catalog; the built-in catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    /// Cadence at which animation frames are pushed over the socket.
    pub frame_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let catalog_path = std::env::var("CATALOG_PATH").map(PathBuf::from).ok();

        let frame_interval_str =
            std::env::var("FRAME_INTERVAL_MS").unwrap_or_else(|_| "80".to_string());
        let frame_interval_ms = frame_interval_str.parse::<u64>().map_err(|e| {
            ConfigError::InvalidValue("FRAME_INTERVAL_MS".to_string(), e.to_string())
        })?;
        // 10-20 fps keeps the avatar fluid without flooding the socket.
        if !(50..=100).contains(&frame_interval_ms) {
            return Err(ConfigError::InvalidValue(
                "FRAME_INTERVAL_MS".to_string(),
                format!("'{}' is outside the supported 50-100ms range", frame_interval_ms),
            ));
        }

        Ok(Self {
            bind_address,
            log_level,
            catalog_path,
            frame_interval: Duration::from_millis(frame_interval_ms),
        })
    }
}
