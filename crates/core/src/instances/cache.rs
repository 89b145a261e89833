//! Shared instance client cache
//!
//! One [`ClientCache`] is created at process start and shared (via `Arc`) by
//! request handlers and the warm-up pass. It maps instance ids to live client
//! handles.
//!
//! # Concurrency
//!
//! - A single reader/writer lock guards the table. [`ClientCache::get`] only
//!   takes the shared lock.
//! - Exclusive access is exposed as a [`ClientCacheWriteGuard`]; `admit` and
//!   `evict` exist only on the guard, so callers batching several mutations
//!   hold the lock for exactly as long as the guard lives.
//! - Misses are single-flight: concurrent callers missing the same id join
//!   one in-flight build instead of dialing the instance several times. A
//!   failed build admits nothing and every joined caller receives the error.
//! - Builds run as their own tasks, so a caller that gives up does not cancel
//!   the build or leave its in-flight entry behind.
//! - [`ClientCache::invalidate`] and [`ClientCache::clear`] supersede builds
//!   that are still running. A superseded build hands its client to the
//!   callers already waiting on it but never admits it.
//!
//! Lock order is in-flight table, then client table.
//!
//! Never call back into the cache while holding a write guard; the lock is
//! not re-entrant.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use opsdeck_domain::{ConnectError, InstanceDescriptor, InstanceId, ResourceKind};
use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use tracing::{debug, info, warn};

use super::ports::{ClientConnector, ClientHandle, InstanceDescriptorStore};

type ClientTable<H> = HashMap<InstanceId, Arc<H>>;
type BuildResult<H> = Result<Built<H>, ConnectError>;
type SharedBuild<H> = Shared<BoxFuture<'static, BuildResult<H>>>;

/// Handle produced by a build, and whether this build created it.
pub(crate) struct Built<H> {
    pub(crate) handle: Arc<H>,
    pub(crate) fresh: bool,
}

impl<H> Clone for Built<H> {
    fn clone(&self) -> Self {
        Self { handle: Arc::clone(&self.handle), fresh: self.fresh }
    }
}

struct InFlight<H> {
    generation: u64,
    build: SharedBuild<H>,
}

struct InFlightTable<H> {
    next_generation: u64,
    builds: HashMap<InstanceId, InFlight<H>>,
}

/// Process-wide mapping from instance id to live client handle.
pub struct ClientCache<C: ClientConnector> {
    connector: Arc<C>,
    store: Arc<dyn InstanceDescriptorStore>,
    table: Arc<RwLock<ClientTable<C::Handle>>>,
    inflight: Arc<Mutex<InFlightTable<C::Handle>>>,
}

impl<C: ClientConnector> ClientCache<C> {
    pub fn new(connector: Arc<C>, store: Arc<dyn InstanceDescriptorStore>) -> Self {
        Self {
            connector,
            store,
            table: Arc::new(RwLock::new(HashMap::new())),
            inflight: Arc::new(Mutex::new(InFlightTable {
                next_generation: 0,
                builds: HashMap::new(),
            })),
        }
    }

    /// Resource kind served by this cache's connector.
    pub fn kind(&self) -> ResourceKind {
        self.connector.kind()
    }

    /// Cached client for `id`, without building one on a miss.
    pub fn get(&self, id: InstanceId) -> Option<Arc<C::Handle>> {
        self.table.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Sorted snapshot of the cached instance ids.
    pub fn ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<_> = self.table.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Take the exclusive lock for direct admission and eviction.
    pub fn write(&self) -> ClientCacheWriteGuard<'_, C::Handle> {
        ClientCacheWriteGuard { table: self.table.write() }
    }

    /// Cached client for `id`, building and admitting one on a miss.
    ///
    /// # Errors
    /// Returns the descriptor lookup or connector error verbatim. Nothing is
    /// admitted when the build fails.
    pub async fn get_or_create(&self, id: InstanceId) -> Result<Arc<C::Handle>, ConnectError> {
        if let Some(handle) = self.get(id) {
            debug!(instance_id = id, "client cache hit");
            return Ok(handle);
        }

        debug!(instance_id = id, "client cache miss");
        self.join_build(id, None).await.map(|built| built.handle)
    }

    /// Build a fresh client for `id` without consulting or touching the cache.
    ///
    /// The caller owns the returned handle and is responsible for closing it.
    pub async fn create_client(&self, id: InstanceId) -> Result<C::Handle, ConnectError> {
        let descriptor = resolve_descriptor(self.store.as_ref(), self.kind(), id).await?;
        self.connector.connect(&descriptor).await
    }

    /// Best-effort release of a handle's transport resources. Failures are
    /// logged, never returned.
    pub async fn close(&self, id: InstanceId, handle: &C::Handle) {
        close_handle(id, handle).await;
    }

    /// Evict `id` and close its client. Returns whether an entry was removed.
    ///
    /// A build for `id` still in flight is superseded and will not be
    /// admitted; the next miss dials again with the current descriptor.
    pub async fn invalidate(&self, id: InstanceId) -> bool {
        if self.inflight.lock().builds.remove(&id).is_some() {
            debug!(instance_id = id, "superseded in-flight client build");
        }

        let removed = self.write().evict(id);
        match removed {
            Some(handle) => {
                close_handle(id, handle.as_ref()).await;
                true
            }
            None => false,
        }
    }

    /// Drop the cached client for `id` and build a new one from the current
    /// descriptor.
    pub async fn refresh(&self, id: InstanceId) -> Result<Arc<C::Handle>, ConnectError> {
        self.invalidate(id).await;
        self.get_or_create(id).await
    }

    /// Evict and close every cached client. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let superseded = {
            let mut inflight = self.inflight.lock();
            let count = inflight.builds.len();
            inflight.builds.clear();
            count
        };
        if superseded > 0 {
            debug!(superseded, "superseded in-flight client builds");
        }

        let drained = self.write().drain();
        let count = drained.len();
        for (id, handle) in drained {
            close_handle(id, handle.as_ref()).await;
        }
        info!(closed = count, "instance client cache cleared");
        count
    }

    pub(crate) fn store(&self) -> &dyn InstanceDescriptorStore {
        self.store.as_ref()
    }

    /// Make sure a client built from `descriptor` is cached.
    pub(crate) async fn ensure(&self, descriptor: InstanceDescriptor) -> BuildResult<C::Handle> {
        let id = descriptor.id;
        if let Some(handle) = self.get(id) {
            return Ok(Built { handle, fresh: false });
        }
        self.join_build(id, Some(descriptor)).await
    }

    async fn join_build(
        &self,
        id: InstanceId,
        descriptor: Option<InstanceDescriptor>,
    ) -> BuildResult<C::Handle> {
        let build = {
            let mut inflight = self.inflight.lock();
            if let Some(existing) = inflight.builds.get(&id) {
                debug!(instance_id = id, "joining in-flight client build");
                existing.build.clone()
            } else if let Some(handle) = self.get(id) {
                // A build completed between the caller's miss and this lock.
                return Ok(Built { handle, fresh: false });
            } else {
                let generation = inflight.next_generation;
                inflight.next_generation = generation.wrapping_add(1);
                let build = self.start_build(id, generation, descriptor).boxed().shared();
                inflight.builds.insert(id, InFlight { generation, build: build.clone() });
                build
            }
        };

        build.await
    }

    fn start_build(
        &self,
        id: InstanceId,
        generation: u64,
        descriptor: Option<InstanceDescriptor>,
    ) -> impl Future<Output = BuildResult<C::Handle>> + Send + 'static {
        let connector = Arc::clone(&self.connector);
        let store = Arc::clone(&self.store);
        let table = Arc::clone(&self.table);
        let inflight = Arc::clone(&self.inflight);

        let task = tokio::spawn({
            let inflight = Arc::clone(&inflight);
            async move {
                let started = Instant::now();
                let built = connect_instance(connector.as_ref(), store.as_ref(), id, descriptor);
                let handle = match built.await {
                    Ok(handle) => handle,
                    Err(err) => {
                        retire(&*inflight, id, generation);
                        return Err(err);
                    }
                };

                let (admitted, replaced) = {
                    let mut inflight = inflight.lock();
                    if is_current(&*inflight, id, generation) {
                        inflight.builds.remove(&id);
                        (true, table.write().insert(id, Arc::clone(&handle)))
                    } else {
                        (false, None)
                    }
                };

                if admitted {
                    info!(
                        instance_id = id,
                        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "instance client built and admitted"
                    );
                } else {
                    debug!(instance_id = id, "superseded client build finished, not admitted");
                }

                if let Some(previous) = replaced {
                    close_handle(id, previous.as_ref()).await;
                }

                Ok(Built { handle, fresh: admitted })
            }
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(err) => {
                    retire(&*inflight, id, generation);
                    warn!(instance_id = id, error = %err, "instance client build aborted");
                    Err(ConnectError::BuildAborted { instance_id: id, reason: err.to_string() })
                }
            }
        }
    }
}

fn is_current<H>(inflight: &InFlightTable<H>, id: InstanceId, generation: u64) -> bool {
    inflight.builds.get(&id).is_some_and(|entry| entry.generation == generation)
}

/// Drop the in-flight entry for `id` unless a newer build replaced it.
fn retire<H>(inflight: &Mutex<InFlightTable<H>>, id: InstanceId, generation: u64) {
    let mut inflight = inflight.lock();
    if is_current(&*inflight, id, generation) {
        inflight.builds.remove(&id);
    }
}

/// Exclusive access to the client table.
///
/// Handles displaced by [`admit`](Self::admit) or removed by
/// [`evict`](Self::evict) are returned so the caller can close them after
/// dropping the guard.
pub struct ClientCacheWriteGuard<'a, H> {
    table: RwLockWriteGuard<'a, ClientTable<H>>,
}

impl<H> ClientCacheWriteGuard<'_, H> {
    /// Insert `handle` under `id`, unconditionally replacing any existing
    /// entry.
    pub fn admit(&mut self, id: InstanceId, handle: Arc<H>) -> Option<Arc<H>> {
        debug!(instance_id = id, "admitting instance client");
        self.table.insert(id, handle)
    }

    /// Remove the entry for `id` if present.
    pub fn evict(&mut self, id: InstanceId) -> Option<Arc<H>> {
        let removed = self.table.remove(&id);
        if removed.is_some() {
            debug!(instance_id = id, "evicted instance client");
        }
        removed
    }

    pub fn get(&self, id: InstanceId) -> Option<&Arc<H>> {
        self.table.get(&id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.table.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub(crate) fn drain(&mut self) -> Vec<(InstanceId, Arc<H>)> {
        self.table.drain().collect()
    }
}

async fn connect_instance<C: ClientConnector>(
    connector: &C,
    store: &dyn InstanceDescriptorStore,
    id: InstanceId,
    descriptor: Option<InstanceDescriptor>,
) -> Result<Arc<C::Handle>, ConnectError> {
    let descriptor = match descriptor {
        Some(descriptor) => descriptor,
        None => resolve_descriptor(store, connector.kind(), id).await?,
    };

    match connector.connect(&descriptor).await {
        Ok(handle) => Ok(Arc::new(handle)),
        Err(err) => {
            debug!(instance_id = id, error = %err, "instance client build failed");
            Err(err)
        }
    }
}

async fn resolve_descriptor(
    store: &dyn InstanceDescriptorStore,
    kind: ResourceKind,
    id: InstanceId,
) -> Result<InstanceDescriptor, ConnectError> {
    match store.find_by_id(id, kind).await {
        Ok(Some(descriptor)) => Ok(descriptor),
        Ok(None) => Err(ConnectError::DescriptorNotFound(id)),
        Err(source) => Err(ConnectError::Store { instance_id: id, source }),
    }
}

async fn close_handle<H: ClientHandle>(id: InstanceId, handle: &H) {
    match handle.close().await {
        Ok(()) => debug!(instance_id = id, "instance client closed"),
        Err(err) => warn!(instance_id = id, error = %err, "failed to close instance client"),
    }
}
