//! Instance commands: registration, cluster access and client lifecycle

use std::time::Instant;

use opsdeck_core::WarmUpReport;
use opsdeck_domain::{
    ConnectionSettings, InstanceDescriptor, InstanceId, NewInstance, OpsDeckError, Result,
};
use opsdeck_infra::ClusterInfo;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::utils::logging::log_command_execution;
use crate::AppContext;

/// Result of a one-off connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub instance_id: InstanceId,
    pub cluster: ClusterInfo,
    pub duration_ms: u64,
}

/// Serializable view of a warm-up pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmUpSummary {
    pub admitted: Vec<InstanceId>,
    pub skipped: Vec<InstanceId>,
    pub failed: Vec<FailedInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedInstance {
    pub instance_id: InstanceId,
    /// Stable error label, e.g. `"connect_timeout"`.
    pub error_type: String,
    pub message: String,
}

impl From<WarmUpReport> for WarmUpSummary {
    fn from(report: WarmUpReport) -> Self {
        Self {
            admitted: report.admitted,
            skipped: report.skipped,
            failed: report
                .failed
                .into_iter()
                .map(|failure| FailedInstance {
                    instance_id: failure.instance_id,
                    error_type: failure.error.label().to_string(),
                    message: failure.error.to_string(),
                })
                .collect(),
        }
    }
}

pub async fn register_instance(
    ctx: &AppContext,
    instance: NewInstance,
) -> Result<InstanceDescriptor> {
    let command_name = "instances::register_instance";
    let start = Instant::now();

    let result = ctx.instances.insert(instance).await;

    let id = result.as_ref().ok().map(|d| d.id);
    log_command_execution(command_name, id, start.elapsed(), &result);
    result
}

/// Replace an instance's connection settings and drop its cached client.
///
/// The next request rebuilds the client from the stored settings.
pub async fn update_instance_connection(
    ctx: &AppContext,
    instance_id: InstanceId,
    settings: ConnectionSettings,
) -> Result<()> {
    let command_name = "instances::update_instance_connection";
    let start = Instant::now();

    let result = ctx.instances.update_connection(instance_id, settings).await;
    if result.is_ok() {
        ctx.search_clients.invalidate(instance_id).await;
    }

    log_command_execution(command_name, Some(instance_id), start.elapsed(), &result);
    result
}

/// Delete an instance registration and close its cached client.
pub async fn delete_instance(ctx: &AppContext, instance_id: InstanceId) -> Result<bool> {
    let command_name = "instances::delete_instance";
    let start = Instant::now();

    let result = ctx.instances.delete(instance_id).await;
    if result.is_ok() {
        ctx.search_clients.invalidate(instance_id).await;
    }

    log_command_execution(command_name, Some(instance_id), start.elapsed(), &result);
    result
}

/// Fetch cluster metadata through the cached client, building it on a miss.
pub async fn cluster_info(ctx: &AppContext, instance_id: InstanceId) -> Result<ClusterInfo> {
    let command_name = "instances::cluster_info";
    let start = Instant::now();

    let result = match ctx.search_clients.get_or_create(instance_id).await {
        Ok(client) => client.cluster_info().await,
        Err(err) => Err(OpsDeckError::from(err)),
    };

    log_command_execution(command_name, Some(instance_id), start.elapsed(), &result);
    result
}

/// Build a throwaway client, query the cluster and close the client.
///
/// The cache is neither read nor updated.
pub async fn test_connection(
    ctx: &AppContext,
    instance_id: InstanceId,
) -> Result<ConnectionTestResult> {
    let command_name = "instances::test_connection";
    let start = Instant::now();

    let result = async {
        let client = ctx.search_clients.create_client(instance_id).await?;
        let cluster = client.cluster_info().await;
        ctx.search_clients.close(instance_id, &client).await;
        Ok::<_, OpsDeckError>(ConnectionTestResult {
            instance_id,
            cluster: cluster?,
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
    .await;

    log_command_execution(command_name, Some(instance_id), start.elapsed(), &result);
    result
}

/// Rebuild the cached client for an instance.
pub async fn reset_client(ctx: &AppContext, instance_id: InstanceId) -> Result<()> {
    let command_name = "instances::reset_client";
    let start = Instant::now();

    let result =
        ctx.search_clients.refresh(instance_id).await.map(|_| ()).map_err(OpsDeckError::from);

    log_command_execution(command_name, Some(instance_id), start.elapsed(), &result);
    result
}

/// Ids of every instance with a cached client, ascending.
pub fn cached_instances(ctx: &AppContext) -> Vec<InstanceId> {
    ctx.search_clients.ids()
}

/// Run a warm-up pass in the foreground and report its outcome.
pub async fn warm_up_clients(ctx: &AppContext) -> WarmUpSummary {
    let start = Instant::now();
    let report = ctx.search_clients.warm_up(ctx.config.clients.warmup_concurrency).await;

    info!(
        command = "instances::warm_up_clients",
        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        total = report.total(),
        "command_execution_success"
    );
    report.into()
}
