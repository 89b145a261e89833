//! Conversions from external infrastructure errors into domain errors.

use std::time::Duration;

use opsdeck_domain::{ConnectError, InstanceId, OpsDeckError};
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub OpsDeckError);

impl From<InfraError> for OpsDeckError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<OpsDeckError> for InfraError {
    fn from(value: OpsDeckError) -> Self {
        InfraError(value)
    }
}

trait IntoOpsDeckError {
    fn into_opsdeck(self) -> OpsDeckError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → OpsDeckError */
/* -------------------------------------------------------------------------- */

impl IntoOpsDeckError for SqlError {
    fn into_opsdeck(self) -> OpsDeckError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        OpsDeckError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        OpsDeckError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        OpsDeckError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 275) => {
                        OpsDeckError::InvalidInput(format!("check constraint failed: {message}"))
                    }
                    _ => OpsDeckError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => OpsDeckError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                OpsDeckError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                OpsDeckError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::IntegralValueOutOfRange(index, value) => {
                OpsDeckError::Database(format!("column {index} value {value} out of range"))
            }
            RE::InvalidPath(path) => OpsDeckError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => OpsDeckError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_opsdeck())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → OpsDeckError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(OpsDeckError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → OpsDeckError */
/* -------------------------------------------------------------------------- */

impl IntoOpsDeckError for HttpError {
    fn into_opsdeck(self) -> OpsDeckError {
        if self.is_timeout() {
            return OpsDeckError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return OpsDeckError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => OpsDeckError::Auth(message),
                404 => OpsDeckError::NotFound(message),
                400..=499 => OpsDeckError::InvalidInput(message),
                _ => OpsDeckError::Network(message),
            };
        }

        if self.is_decode() {
            return OpsDeckError::Network(format!("malformed response body: {self}"));
        }

        OpsDeckError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_opsdeck())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ConnectError */
/* -------------------------------------------------------------------------- */

/// Classify a transport failure raised while dialing or probing `address`
/// for instance `instance_id`.
pub fn connect_error_from_http(
    err: &HttpError,
    instance_id: InstanceId,
    address: &str,
    timeout: Duration,
) -> ConnectError {
    let address = address.to_string();

    if err.is_timeout() {
        return ConnectError::ConnectTimeout { instance_id, address, timeout };
    }

    if let Some(status) = err.status() {
        return ConnectError::UnhealthyResponse { instance_id, address, status: status.as_u16() };
    }

    if err.is_builder() {
        return ConnectError::InvalidConfig { instance_id, reason: err.to_string() };
    }

    ConnectError::ConnectRefused { instance_id, address, reason: error_chain(err) }
}

/// `reqwest` keeps the useful cause (DNS, TLS, refused) in the source chain.
fn error_chain(err: &HttpError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
