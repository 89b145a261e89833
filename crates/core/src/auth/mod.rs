//! Credential handling for instance clients
//!
//! - [`parser`]: turns stored free-form credential text into a
//!   [`CredentialSet`](opsdeck_domain::CredentialSet). Never fails.
//! - [`scheme`]: picks the one [`AuthScheme`](opsdeck_domain::AuthScheme) a
//!   client is configured with, using a fixed precedence list.

pub mod parser;
pub mod scheme;

pub use parser::parse_auth_config;
pub use scheme::select_auth_scheme;
