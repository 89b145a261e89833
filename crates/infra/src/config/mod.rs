//! Configuration loading
//!
//! Resolves [`opsdeck_domain::Config`] from `OPSDECK_*` environment variables,
//! a JSON or TOML file, or built-in defaults.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
