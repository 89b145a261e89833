//! Error types used throughout the application

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::InstanceId;

/// Main error type for OpsDeck
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum OpsDeckError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for OpsDeck operations
pub type Result<T> = std::result::Result<T, OpsDeckError>;

/// Failures while resolving, dialing or probing an instance client.
///
/// Every variant names the instance it concerns. Credential parse anomalies
/// are absent: the auth config parser absorbs them into a best-effort result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("instance {0} has no network address configured")]
    MissingAddress(InstanceId),

    #[error("instance {0} not found")]
    DescriptorNotFound(InstanceId),

    #[error("instance {instance_id}: invalid address '{address}': {reason}")]
    InvalidAddress { instance_id: InstanceId, address: String, reason: String },

    #[error("instance {instance_id}: invalid client configuration: {reason}")]
    InvalidConfig { instance_id: InstanceId, reason: String },

    #[error("instance {instance_id}: timed out connecting to {address} after {timeout:?}")]
    ConnectTimeout { instance_id: InstanceId, address: String, timeout: Duration },

    #[error("instance {instance_id}: connection to {address} refused: {reason}")]
    ConnectRefused { instance_id: InstanceId, address: String, reason: String },

    #[error("instance {instance_id}: liveness probe against {address} returned HTTP {status}")]
    UnhealthyResponse { instance_id: InstanceId, address: String, status: u16 },

    #[error("instance {instance_id}: descriptor lookup failed: {source}")]
    Store { instance_id: InstanceId, source: OpsDeckError },

    #[error("instance {instance_id}: client build did not complete: {reason}")]
    BuildAborted { instance_id: InstanceId, reason: String },
}

impl ConnectError {
    /// Stable label suitable for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingAddress(_) => "missing_address",
            Self::DescriptorNotFound(_) => "descriptor_not_found",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::InvalidConfig { .. } => "invalid_config",
            Self::ConnectTimeout { .. } => "connect_timeout",
            Self::ConnectRefused { .. } => "connect_refused",
            Self::UnhealthyResponse { .. } => "unhealthy_response",
            Self::Store { .. } => "store",
            Self::BuildAborted { .. } => "build_aborted",
        }
    }

    /// Instance the failure concerns.
    pub fn instance_id(&self) -> InstanceId {
        match self {
            Self::MissingAddress(id) | Self::DescriptorNotFound(id) => *id,
            Self::InvalidAddress { instance_id, .. }
            | Self::InvalidConfig { instance_id, .. }
            | Self::ConnectTimeout { instance_id, .. }
            | Self::ConnectRefused { instance_id, .. }
            | Self::UnhealthyResponse { instance_id, .. }
            | Self::Store { instance_id, .. }
            | Self::BuildAborted { instance_id, .. } => *instance_id,
        }
    }
}

impl OpsDeckError {
    /// Same variant with its message rewritten by `f`.
    pub fn map_message(self, f: impl FnOnce(String) -> String) -> Self {
        match self {
            Self::Database(msg) => Self::Database(f(msg)),
            Self::Config(msg) => Self::Config(f(msg)),
            Self::Network(msg) => Self::Network(f(msg)),
            Self::Auth(msg) => Self::Auth(f(msg)),
            Self::NotFound(msg) => Self::NotFound(f(msg)),
            Self::InvalidInput(msg) => Self::InvalidInput(f(msg)),
            Self::Internal(msg) => Self::Internal(f(msg)),
        }
    }
}

impl From<ConnectError> for OpsDeckError {
    fn from(value: ConnectError) -> Self {
        match value {
            ConnectError::MissingAddress(_) | ConnectError::InvalidAddress { .. } => {
                OpsDeckError::InvalidInput(value.to_string())
            }
            ConnectError::DescriptorNotFound(_) => OpsDeckError::NotFound(value.to_string()),
            ConnectError::InvalidConfig { .. } => OpsDeckError::Config(value.to_string()),
            ConnectError::UnhealthyResponse { status: 401 | 403, .. } => {
                OpsDeckError::Auth(value.to_string())
            }
            ConnectError::ConnectTimeout { .. }
            | ConnectError::ConnectRefused { .. }
            | ConnectError::UnhealthyResponse { .. } => OpsDeckError::Network(value.to_string()),
            ConnectError::Store { instance_id, source } => {
                source.map_message(|msg| format!("instance {instance_id}: {msg}"))
            }
            ConnectError::BuildAborted { .. } => OpsDeckError::Internal(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_address_maps_to_invalid_input() {
        let err: OpsDeckError = ConnectError::MissingAddress(7).into();
        match err {
            OpsDeckError::InvalidInput(msg) => assert!(msg.contains("instance 7")),
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[test]
    fn unauthorized_response_maps_to_auth() {
        let err: OpsDeckError = ConnectError::UnhealthyResponse {
            instance_id: 4,
            address: "es:9200".into(),
            status: 401,
        }
        .into();
        assert!(matches!(err, OpsDeckError::Auth(_)));
    }

    #[test]
    fn network_failures_name_the_instance() {
        let err = ConnectError::ConnectRefused {
            instance_id: 12,
            address: "es:9200".into(),
            reason: "connection refused".into(),
        };
        assert_eq!(err.instance_id(), 12);

        let err: OpsDeckError = err.into();
        match err {
            OpsDeckError::Network(msg) => {
                assert!(msg.starts_with("instance 12:"), "got {msg}");
                assert!(msg.contains("es:9200"));
            }
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[test]
    fn store_errors_keep_their_variant_and_gain_the_instance() {
        let err: OpsDeckError = ConnectError::Store {
            instance_id: 5,
            source: OpsDeckError::Database("database is locked".into()),
        }
        .into();
        assert_eq!(err, OpsDeckError::Database("instance 5: database is locked".into()));
    }

    #[test]
    fn aborted_builds_map_to_internal() {
        let err: OpsDeckError =
            ConnectError::BuildAborted { instance_id: 9, reason: "task panicked".into() }.into();
        assert!(matches!(err, OpsDeckError::Internal(msg) if msg.contains("instance 9")));
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(OpsDeckError::NotFound("instance 3".into())).unwrap();
        assert_eq!(json["type"], "NotFound");
        assert_eq!(json["message"], "instance 3");
    }
}
