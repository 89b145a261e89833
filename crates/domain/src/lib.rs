//! # OpsDeck Domain
//!
//! Domain types shared by every OpsDeck crate.
//!
//! This crate contains:
//! - Resource instance descriptors and resource kinds
//! - Credential records produced by the auth config parser
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other OpsDeck crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
