//! Logging setup
//!
//! Installs a global `tracing` subscriber: an [`EnvFilter`] honouring
//! `RUST_LOG` (falling back to the configured level) and either a compact or
//! a JSON formatting layer.

use opsdeck_domain::{LoggingConfig, OpsDeckError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed (tests, or a
/// second call), leaving the existing one in place.
///
/// # Errors
/// Returns `OpsDeckError::Config` when neither `RUST_LOG` nor the configured
/// level is a valid filter directive.
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    let filter = build_filter(&config.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false).with_target(true))
            .try_init()
    } else {
        registry.with(fmt::layer().compact().with_target(true)).try_init()
    };

    match installed {
        Ok(()) => {
            tracing::debug!(level = %config.level, json = config.json, "logging initialised");
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(level)
        .map_err(|err| OpsDeckError::Config(format!("invalid log level '{level}': {err}")))
}
