use std::time::Duration;

use opsdeck_domain::{InstanceId, OpsDeckError, Result};
use tracing::{info, warn};

/// Log the outcome of a command execution with structured fields.
///
/// `command` is a stable identifier such as `"instances::cluster_info"`.
/// Callers must not forward credentials in `command` or `instance_id`.
#[inline]
pub fn log_command_execution<T>(
    command: &str,
    instance_id: Option<InstanceId>,
    elapsed: Duration,
    result: &Result<T>,
) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(_) => info!(command, ?instance_id, duration_ms, "command_execution_success"),
        Err(err) => warn!(
            command,
            ?instance_id,
            duration_ms,
            error_type = error_label(err),
            error = %err,
            "command_execution_failure"
        ),
    }
}

/// Convert an `OpsDeckError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &OpsDeckError) -> &'static str {
    match error {
        OpsDeckError::Database(_) => "database",
        OpsDeckError::Config(_) => "config",
        OpsDeckError::Network(_) => "network",
        OpsDeckError::Auth(_) => "auth",
        OpsDeckError::NotFound(_) => "not_found",
        OpsDeckError::InvalidInput(_) => "invalid_input",
        OpsDeckError::Internal(_) => "internal",
    }
}
