#![allow(dead_code)]

use std::sync::Arc;

use opsdeck_domain::{InstanceDescriptor, NewInstance, ResourceKind};
use opsdeck_infra::database::{DbManager, SqliteInstanceRepository};
use tempfile::TempDir;
use wiremock::MockServer;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with the schema applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn repository(&self) -> SqliteInstanceRepository {
        SqliteInstanceRepository::new(Arc::clone(&self.manager))
    }

    /// Execute a batch of SQL statements against the database.
    pub fn execute_batch(&self, sql: &str) {
        let conn = self
            .manager
            .get_connection()
            .expect("connection should be available for execute_batch");
        conn.execute_batch(sql).expect("SQL batch execution should succeed");
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// `host:port` of a wiremock server, as stored in an instance row.
pub fn address_of(server: &MockServer) -> String {
    server.address().to_string()
}

/// Elasticsearch registration pointing at `address`.
pub fn search_instance(name: &str, address: Option<&str>) -> NewInstance {
    let instance = NewInstance::new(name, ResourceKind::Elasticsearch);
    match address {
        Some(address) => instance.with_address(address),
        None => instance,
    }
}

/// Unpersisted descriptor for factory tests that do not need a database.
pub fn descriptor(address: Option<String>, auth_config: &str) -> InstanceDescriptor {
    InstanceDescriptor {
        id: 1,
        name: "logs".to_string(),
        kind: ResourceKind::Elasticsearch,
        address,
        https_enabled: None,
        skip_tls_verify: None,
        auth_config: auth_config.to_string(),
        updated_at: chrono::Utc::now(),
    }
}
