//! Infrastructure error conversions

mod conversions;

pub use conversions::{connect_error_from_http, InfraError};
