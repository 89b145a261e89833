//! Startup warm-up of instance clients
//!
//! Lists every registered instance of the cache's resource kind and builds a
//! client for each one not already cached. A single unreachable or
//! misconfigured instance never aborts the pass.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use opsdeck_domain::{ConnectError, InstanceId};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::cache::ClientCache;
use super::ports::ClientConnector;

/// Outcome of one warm-up pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmUpReport {
    /// Instances whose client was built during the pass.
    pub admitted: Vec<InstanceId>,
    /// Instances that were already cached.
    pub skipped: Vec<InstanceId>,
    pub failed: Vec<WarmUpFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmUpFailure {
    pub instance_id: InstanceId,
    pub error: ConnectError,
}

impl WarmUpReport {
    /// Number of instances the pass looked at.
    pub fn total(&self) -> usize {
        self.admitted.len() + self.skipped.len() + self.failed.len()
    }
}

impl<C: ClientConnector> ClientCache<C> {
    /// Build and admit clients for every listed instance, at most
    /// `concurrency` at a time.
    ///
    /// A failure to list instances is logged and yields an empty report.
    /// Per-instance failures are logged and collected in
    /// [`WarmUpReport::failed`]; the instance stays absent from the cache.
    pub async fn warm_up(&self, concurrency: usize) -> WarmUpReport {
        let kind = self.kind();
        let started = Instant::now();

        let descriptors = match self.store().find_all_by_kind(kind).await {
            Ok(descriptors) => descriptors,
            Err(err) => {
                error!(%kind, error = %err, "warm-up could not list instances");
                return WarmUpReport::default();
            }
        };

        info!(%kind, instances = descriptors.len(), concurrency, "warming up instance clients");

        let outcomes: Vec<_> = stream::iter(descriptors)
            .map(|descriptor| async move {
                let id = descriptor.id;
                (id, self.ensure(descriptor).await)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let mut report = WarmUpReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(built) if built.fresh => report.admitted.push(id),
                Ok(_) => report.skipped.push(id),
                Err(error) => {
                    warn!(
                        instance_id = id,
                        reason = error.label(),
                        error = %error,
                        "instance skipped during warm-up"
                    );
                    report.failed.push(WarmUpFailure { instance_id: id, error });
                }
            }
        }

        report.admitted.sort_unstable();
        report.skipped.sort_unstable();
        report.failed.sort_by_key(|failure| failure.instance_id);

        info!(
            %kind,
            admitted = report.admitted.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "instance client warm-up finished"
        );

        report
    }
}

/// Run [`ClientCache::warm_up`] as a background task.
///
/// Requests served while the task runs go through the normal miss path and
/// join any build the warm-up already has in flight for the same instance.
pub fn spawn_warm_up<C: ClientConnector>(
    cache: Arc<ClientCache<C>>,
    concurrency: usize,
) -> JoinHandle<WarmUpReport> {
    tokio::spawn(async move { cache.warm_up(concurrency).await })
}
