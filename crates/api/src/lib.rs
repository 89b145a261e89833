//! # OpsDeck App
//!
//! Application layer - commands and main entry point.
//!
//! This crate contains:
//! - Instance commands (cluster info, connection tests, client resets)
//! - Application context (dependency injection)
//! - Main entry point and setup
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
