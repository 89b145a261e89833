//! Application context - dependency injection container

use std::fs;
use std::path::Path;
use std::sync::Arc;

use opsdeck_core::{spawn_warm_up, ClientCache, InstanceDescriptorStore, WarmUpReport};
use opsdeck_domain::{Config, OpsDeckError, Result};
use opsdeck_infra::{DbManager, SearchClientFactory, SqliteInstanceRepository};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Client cache for search cluster instances.
pub type SearchClientCache = ClientCache<SearchClientFactory>;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub instances: Arc<SqliteInstanceRepository>,
    pub search_clients: Arc<SearchClientCache>,

    warm_up: Mutex<Option<JoinHandle<WarmUpReport>>>,
}

impl AppContext {
    /// Create a context from the loaded configuration (env, file, defaults).
    pub async fn new() -> Result<Self> {
        let config = opsdeck_infra::config::load()?;
        Self::new_with_config(config).await
    }

    /// Create a context with explicit configuration
    ///
    /// Opens the database, applies the schema and builds an empty client
    /// cache. Warm-up is not started; call [`AppContext::start_warm_up`].
    pub async fn new_with_config(config: Config) -> Result<Self> {
        ensure_parent_dir(Path::new(&config.database.path))?;

        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let instances = Arc::new(SqliteInstanceRepository::new(Arc::clone(&db)));
        let store: Arc<dyn InstanceDescriptorStore> = instances.clone();
        let factory = Arc::new(SearchClientFactory::new(config.clients.clone()));
        let search_clients = Arc::new(ClientCache::new(factory, store));

        info!(
            db_path = %config.database.path,
            warmup_concurrency = config.clients.warmup_concurrency,
            "application context initialised"
        );

        Ok(Self { config, db, instances, search_clients, warm_up: Mutex::new(None) })
    }

    /// Start the background warm-up of every registered search instance.
    ///
    /// Returns `false` when a warm-up task is already running.
    pub fn start_warm_up(&self) -> bool {
        let mut slot = self.warm_up.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        *slot = Some(spawn_warm_up(
            Arc::clone(&self.search_clients),
            self.config.clients.warmup_concurrency,
        ));
        true
    }

    /// Wait for the warm-up task started by [`AppContext::start_warm_up`].
    ///
    /// Returns `None` if no warm-up was started, it was already awaited, or
    /// the task was cancelled.
    pub async fn wait_for_warm_up(&self) -> Option<WarmUpReport> {
        let handle = self.warm_up.lock().take()?;
        match handle.await {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(error = %err, "warm-up task did not complete");
                None
            }
        }
    }

    /// Get application health
    pub async fn health_check(&self) -> HealthStatus {
        let mut status = HealthStatus::new()
            .add_component(self.check_database_health().await)
            .add_component(ComponentHealth::healthy_with(
                "search_clients",
                format!("{} cached", self.search_clients.len()),
            ));

        status.calculate_score();
        status
    }

    async fn check_database_health(&self) -> ComponentHealth {
        let db = Arc::clone(&self.db);
        match tokio::task::spawn_blocking(move || db.health_check()).await {
            Ok(Ok(())) => ComponentHealth::healthy("database"),
            Ok(Err(e)) => {
                warn!(error = %e, "database health check failed");
                ComponentHealth::unhealthy("database", format!("query failed: {e}"))
            }
            Err(e) => {
                tracing::error!(error = %e, "database health check task panicked");
                ComponentHealth::unhealthy("database", format!("task panic: {e}"))
            }
        }
    }

    /// Shut the context down
    ///
    /// Cancels a running warm-up, then closes and evicts every cached client.
    /// Safe to call more than once.
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(handle) = self.warm_up.lock().take() {
            if !handle.is_finished() {
                info!("cancelling warm-up task");
            }
            handle.abort();
        }

        let closed = self.search_clients.clear().await;
        info!(closed_clients = closed, "application context shut down");
        Ok(())
    }
}

fn ensure_parent_dir(db_path: &Path) -> Result<()> {
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|err| {
                OpsDeckError::Internal(format!(
                    "failed to create database directory {}: {}",
                    parent.display(),
                    err
                ))
            })
        }
        _ => Ok(()),
    }
}
