//! In-memory mock for `InstanceDescriptorStore`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use opsdeck_core::InstanceDescriptorStore;
use opsdeck_domain::{
    InstanceDescriptor, InstanceId, OpsDeckError, ResourceKind, Result as DomainResult,
};
use parking_lot::RwLock;

#[derive(Default)]
pub struct MockDescriptorStore {
    descriptors: RwLock<HashMap<InstanceId, InstanceDescriptor>>,
    fail_listing: AtomicBool,
}

impl MockDescriptorStore {
    pub fn new(descriptors: impl IntoIterator<Item = InstanceDescriptor>) -> Self {
        let store = Self::default();
        for descriptor in descriptors {
            store.upsert(descriptor);
        }
        store
    }

    pub fn upsert(&self, descriptor: InstanceDescriptor) {
        self.descriptors.write().insert(descriptor.id, descriptor);
    }

    pub fn set_address(&self, id: InstanceId, address: &str) {
        if let Some(descriptor) = self.descriptors.write().get_mut(&id) {
            descriptor.address = Some(address.to_string());
        }
    }

    /// Make `find_all_by_kind` fail until reset.
    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl InstanceDescriptorStore for MockDescriptorStore {
    async fn find_by_id(
        &self,
        id: InstanceId,
        kind: ResourceKind,
    ) -> DomainResult<Option<InstanceDescriptor>> {
        Ok(self.descriptors.read().get(&id).filter(|desc| desc.kind == kind).cloned())
    }

    async fn find_all_by_kind(&self, kind: ResourceKind) -> DomainResult<Vec<InstanceDescriptor>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(OpsDeckError::Database("descriptor table unavailable".into()));
        }

        let mut found: Vec<_> =
            self.descriptors.read().values().filter(|desc| desc.kind == kind).cloned().collect();
        found.sort_by_key(|desc| desc.id);
        Ok(found)
    }
}
