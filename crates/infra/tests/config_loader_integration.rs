//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;
use std::path::PathBuf;

use opsdeck_domain::{ClientConfig, OpsDeckError};
use opsdeck_infra::config;
use tempfile::NamedTempFile;

fn write_config(contents: &str, extension: &str) -> PathBuf {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    path
}

#[test]
fn test_load_config_from_json_file() {
    let path = write_config(
        r#"{
            "database": { "path": "/tmp/integration_test.db", "pool_size": 10 },
            "clients": {
                "connect_timeout_secs": 3,
                "probe_timeout_secs": 5,
                "warmup_concurrency": 16,
                "user_agent": "opsdeck-it"
            },
            "logging": { "level": "debug", "json": true }
        }"#,
        "json",
    );

    let result = config::load_from_file(Some(path.clone()));
    std::fs::remove_file(path).ok();
    let config = result.expect("Failed to load config from JSON file");

    assert_eq!(config.database.path, "/tmp/integration_test.db");
    assert_eq!(config.database.pool_size, 10);
    assert_eq!(config.clients.connect_timeout_secs, 3);
    assert_eq!(config.clients.probe_timeout_secs, 5);
    assert_eq!(config.clients.warmup_concurrency, 16);
    assert_eq!(config.clients.user_agent, "opsdeck-it");
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
}

#[test]
fn test_load_config_from_toml_file() {
    let path = write_config(
        r#"
[database]
path = "/tmp/integration_test_toml.db"
pool_size = 8

[clients]
warmup_concurrency = 2
"#,
        "toml",
    );

    let result = config::load_from_file(Some(path.clone()));
    std::fs::remove_file(path).ok();
    let config = result.expect("Failed to load config from TOML file");

    assert_eq!(config.database.path, "/tmp/integration_test_toml.db");
    assert_eq!(config.clients.warmup_concurrency, 2);
    assert_eq!(config.clients.probe_timeout_secs, ClientConfig::default().probe_timeout_secs);
}

#[test]
fn test_load_config_with_minimal_fields() {
    let path = write_config("{}", "json");

    let result = config::load_from_file(Some(path.clone()));
    std::fs::remove_file(path).ok();

    assert_eq!(result.expect("empty object should load"), opsdeck_domain::Config::default());
}

#[test]
fn test_wrong_field_type_is_config_error() {
    let path = write_config(r#"{ "clients": { "warmup_concurrency": "many" } }"#, "json");

    let result = config::load_from_file(Some(path.clone()));
    std::fs::remove_file(path).ok();

    assert!(matches!(result, Err(OpsDeckError::Config(_))));
}
