//! Per-instance client lifecycle
//!
//! - [`ports`]: traits implemented by infrastructure (descriptor store,
//!   connector, client handle)
//! - [`cache`]: shared id -> client table with single-flight construction
//! - [`warmup`]: startup pass that builds clients for every known instance

pub mod cache;
pub mod ports;
pub mod warmup;
