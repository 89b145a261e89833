//! Shared test helpers for `opsdeck-core` integration tests.
//!
//! In-memory descriptor storage and a scripted connector, so cache and
//! warm-up tests can focus on lifecycle behaviour instead of networking.

#![allow(dead_code)]

pub mod connector;
pub mod store;

use chrono::Utc;
use opsdeck_domain::{InstanceDescriptor, InstanceId, ResourceKind};

/// Elasticsearch descriptor with the given address and no credentials.
pub fn descriptor(id: InstanceId, address: Option<&str>) -> InstanceDescriptor {
    InstanceDescriptor {
        id,
        name: format!("cluster-{id}"),
        kind: ResourceKind::Elasticsearch,
        address: address.map(str::to_string),
        https_enabled: None,
        skip_tls_verify: None,
        auth_config: String::new(),
        updated_at: Utc::now(),
    }
}
