//! Resource instance descriptors
//!
//! A descriptor is a read-only snapshot of one registered external cluster as
//! stored in the `resource_instances` table. The client lifecycle code never
//! mutates descriptors; it re-fetches them whenever it needs fresh settings.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::OpsDeckError;

/// Stable identifier of a registered instance.
pub type InstanceId = u64;

/// Kind of external service an instance row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Elasticsearch,
    Kubernetes,
}


impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [Self::Elasticsearch, Self::Kubernetes];

    /// Value of the `resource_type` column for this kind.
    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::Elasticsearch => "search",
            Self::Kubernetes => "container",
        }
    }

    /// Value of the `sub_type` column for this kind.
    pub fn sub_type(&self) -> &'static str {
        match self {
            Self::Elasticsearch => "elasticsearch",
            Self::Kubernetes => "kubernetes",
        }
    }

    /// Map a stored `(resource_type, sub_type)` pair back to a kind.
    pub fn from_columns(resource_type: &str, sub_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.resource_type() == resource_type && kind.sub_type() == sub_type)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sub_type())
    }
}

/// Parses the `sub_type` name, ignoring ASCII case.
impl FromStr for ResourceKind {
    type Err = OpsDeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.sub_type().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OpsDeckError::InvalidInput(format!("unknown resource kind '{s}'")))
    }
}

/// Snapshot of one registered instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDescriptor {
    pub id: InstanceId,
    pub name: String,
    pub kind: ResourceKind,
    /// `host:port`, unset until an operator configures it.
    pub address: Option<String>,
    pub https_enabled: Option<bool>,
    pub skip_tls_verify: Option<bool>,
    /// Free-form credential payload; see the auth config parser.
    pub auth_config: String,
    pub updated_at: DateTime<Utc>,
}

impl InstanceDescriptor {
    /// Trimmed address, `None` when unset or blank.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref().map(str::trim).filter(|addr| !addr.is_empty())
    }

    pub fn uses_https(&self) -> bool {
        self.https_enabled == Some(true)
    }

    pub fn skips_tls_verify(&self) -> bool {
        self.skip_tls_verify == Some(true)
    }

    /// URL scheme derived from the https flag.
    pub fn scheme(&self) -> &'static str {
        if self.uses_https() {
            "https"
        } else {
            "http"
        }
    }
}

/// Fields required to register a new instance. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInstance {
    pub name: String,
    pub kind: ResourceKind,
    pub address: Option<String>,
    pub https_enabled: Option<bool>,
    pub skip_tls_verify: Option<bool>,
    pub auth_config: String,
}

impl NewInstance {
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            address: None,
            https_enabled: None,
            skip_tls_verify: None,
            auth_config: String::new(),
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_tls(mut self, https_enabled: Option<bool>, skip_tls_verify: Option<bool>) -> Self {
        self.https_enabled = https_enabled;
        self.skip_tls_verify = skip_tls_verify;
        self
    }

    pub fn with_auth_config(mut self, auth_config: impl Into<String>) -> Self {
        self.auth_config = auth_config.into();
        self
    }
}

/// Connection fields an operator can edit after registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub address: Option<String>,
    pub https_enabled: Option<bool>,
    pub skip_tls_verify: Option<bool>,
    pub auth_config: String,
}
