//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Environment variables, when `OPSDECK_DB_PATH` is set
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//! 3. Otherwise built-in defaults
//!
//! ## Environment Variables
//! - `OPSDECK_DB_PATH`: Database file path (selects env loading)
//! - `OPSDECK_DB_POOL_SIZE`: Connection pool size
//! - `OPSDECK_CONNECT_TIMEOUT_SECS`: Instance dial timeout in seconds
//! - `OPSDECK_PROBE_TIMEOUT_SECS`: Liveness probe deadline in seconds
//! - `OPSDECK_WARMUP_CONCURRENCY`: Parallel builds during warm-up
//! - `OPSDECK_LOG_LEVEL`: Fallback log filter when `RUST_LOG` is unset
//! - `OPSDECK_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! Unset optional variables keep their defaults.
//!
//! ## File Locations
//! `config.{json,toml}` and `opsdeck.{json,toml}` in the working directory,
//! then `config.{json,toml}` up to two parent directories, then the same set
//! relative to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use opsdeck_domain::{Config, OpsDeckError, Result};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `OpsDeckError::Config` if an environment value or the selected
/// file is invalid. A missing file is not an error.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            return Ok(config);
        }
        Err(OpsDeckError::Config(msg)) if msg.starts_with(MISSING_PREFIX) => {
            tracing::debug!(reason = %msg, "Environment configuration absent, trying file");
        }
        Err(err) => return Err(err),
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

const MISSING_PREFIX: &str = "Missing required environment variable";

/// Load configuration from environment variables
///
/// `OPSDECK_DB_PATH` is required; every other variable is optional.
///
/// # Errors
/// Returns `OpsDeckError::Config` if `OPSDECK_DB_PATH` is missing or a
/// numeric variable does not parse.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.database.path = env_var("OPSDECK_DB_PATH")?;
    if let Some(pool_size) = env_parse("OPSDECK_DB_POOL_SIZE")? {
        config.database.pool_size = pool_size;
    }

    if let Some(secs) = env_parse("OPSDECK_CONNECT_TIMEOUT_SECS")? {
        config.clients.connect_timeout_secs = secs;
    }
    if let Some(secs) = env_parse("OPSDECK_PROBE_TIMEOUT_SECS")? {
        config.clients.probe_timeout_secs = secs;
    }
    if let Some(concurrency) = env_parse("OPSDECK_WARMUP_CONCURRENCY")? {
        config.clients.warmup_concurrency = concurrency;
    }

    if let Ok(level) = std::env::var("OPSDECK_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("OPSDECK_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. JSON and TOML are
/// supported (detected by file extension); omitted fields take defaults.
///
/// # Errors
/// Returns `OpsDeckError::Config` if the file is missing, unreadable, or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(OpsDeckError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            OpsDeckError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| OpsDeckError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| OpsDeckError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| OpsDeckError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(OpsDeckError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a config file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("opsdeck.json"),
        dir.join("opsdeck.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| OpsDeckError::Config(format!("{MISSING_PREFIX}: {key}")))
}

/// Parse an optional numeric environment variable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| OpsDeckError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
