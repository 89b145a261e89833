//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    DEFAULT_WARMUP_CONCURRENCY,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub clients: ClientConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Instance client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Bound on dialing and waiting for response headers.
    pub connect_timeout_secs: u64,
    /// Overall deadline for the liveness probe.
    pub probe_timeout_secs: u64,
    /// How many instances warm-up builds in parallel.
    pub warmup_concurrency: usize,
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human readable output.
    pub json: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "opsdeck.db".to_string(), pool_size: 8 }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            warmup_concurrency: DEFAULT_WARMUP_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "clients": { "warmup_concurrency": 2 } }"#).unwrap();

        assert_eq!(config.clients.warmup_concurrency, 2);
        assert_eq!(config.clients.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert_eq!(config.database, DatabaseConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn zero_timeouts_are_clamped() {
        let config = ClientConfig { connect_timeout_secs: 0, probe_timeout_secs: 0, ..Default::default() };
        assert_eq!(config.connect_timeout(), Duration::from_secs(1));
        assert_eq!(config.probe_timeout(), Duration::from_secs(1));
    }
}
