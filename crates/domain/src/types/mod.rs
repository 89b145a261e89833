//! Domain types and models

pub mod credentials;
pub mod instance;

pub use credentials::{AuthEncoding, AuthScheme, CredentialRecord, CredentialSet, CredentialValue};
pub use instance::{
    ConnectionSettings, InstanceDescriptor, InstanceId, NewInstance, ResourceKind,
};
