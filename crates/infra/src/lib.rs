//! # OpsDeck Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - SQLite descriptor storage (r2d2 pool + rusqlite)
//! - The reqwest based search cluster client factory
//! - Configuration loading and logging setup
//!
//! ## Architecture
//! - Implements traits defined in `opsdeck-core`
//! - Contains all "impure" code (database and network I/O)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use database::{DbManager, SqliteInstanceRepository};
pub use errors::InfraError;
pub use http::{ClusterInfo, HttpClientBuilder, SearchClient, SearchClientFactory};
pub use observability::init_logging;
