//! Port interfaces for instance clients
//!
//! These traits define the boundaries between the client cache and the
//! infrastructure that stores instance descriptors and dials clusters.

use async_trait::async_trait;
use opsdeck_domain::{ConnectError, InstanceDescriptor, InstanceId, ResourceKind, Result};

/// Read access to stored instance descriptors.
#[async_trait]
pub trait InstanceDescriptorStore: Send + Sync {
    /// Get the descriptor with `id`, provided it is stored under `kind`.
    async fn find_by_id(
        &self,
        id: InstanceId,
        kind: ResourceKind,
    ) -> Result<Option<InstanceDescriptor>>;

    /// List every descriptor stored under `kind`.
    async fn find_all_by_kind(&self, kind: ResourceKind) -> Result<Vec<InstanceDescriptor>>;
}

/// A live client bound to one instance.
///
/// Handles are shared between request handlers and must be safe for
/// concurrent use.
#[async_trait]
pub trait ClientHandle: Send + Sync + 'static {
    /// Release idle transport resources. Calls after the first are no-ops.
    async fn close(&self) -> Result<()>;
}

/// Builds verified clients for one resource kind.
#[async_trait]
pub trait ClientConnector: Send + Sync + 'static {
    type Handle: ClientHandle;

    /// Kind of descriptor this connector understands.
    fn kind(&self) -> ResourceKind;

    /// Dial the instance and confirm it is live. Only fully verified handles
    /// are returned; no retries happen here.
    async fn connect(
        &self,
        descriptor: &InstanceDescriptor,
    ) -> std::result::Result<Self::Handle, ConnectError>;
}
