//! # OpsDeck Core
//!
//! Business logic for the per-instance client lifecycle - no infrastructure
//! dependencies.
//!
//! This crate contains:
//! - The auth config parser and credential scheme selection
//! - Port interfaces (traits) for descriptor storage and client connectors
//! - The shared client cache and its startup warm-up pass
//!
//! ## Architecture Principles
//! - Only depends on `opsdeck-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod auth;
pub mod instances;

// Re-export specific items to avoid ambiguity
pub use auth::{parse_auth_config, select_auth_scheme};
pub use instances::cache::{ClientCache, ClientCacheWriteGuard};
pub use instances::ports::{ClientConnector, ClientHandle, InstanceDescriptorStore};
pub use instances::warmup::{spawn_warm_up, WarmUpFailure, WarmUpReport};
