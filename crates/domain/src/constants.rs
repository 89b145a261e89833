//! Domain constants
//!
//! Defaults for the instance client lifecycle. Configuration overrides most of
//! these at runtime; see [`crate::config::ClientConfig`].

/// Seconds allowed for dialing an instance and receiving response headers.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Overall deadline for the liveness probe issued after dialing.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Number of instances built in parallel during warm-up.
pub const DEFAULT_WARMUP_CONCURRENCY: usize = 4;

pub const DEFAULT_USER_AGENT: &str = "opsdeck/0.1";

/// Credential scheme names in the order the client factory applies them.
/// The first scheme present in a credential set wins.
pub const CREDENTIAL_SCHEME_PRECEDENCE: [&str; 2] = ["basic", "api_key"];
