//! SQLite-backed resource instance repository.
//!
//! Implements the `InstanceDescriptorStore` port over the
//! `resource_instances` table, plus the registration CRUD used by tooling and
//! tests. All database operations run in `spawn_blocking` to avoid blocking
//! the async runtime.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use opsdeck_core::InstanceDescriptorStore;
use opsdeck_domain::{
    ConnectionSettings, InstanceDescriptor, InstanceId, NewInstance, OpsDeckError, ResourceKind,
    Result as DomainResult,
};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use tracing::debug;

use super::manager::{map_sql_error, DbManager};

const SELECT_COLUMNS: &str = "id, name, resource_type, sub_type, address, https_enabled, \
                              skip_tls_verify, auth_config, updated_at";

pub struct SqliteInstanceRepository {
    db: Arc<DbManager>,
}

impl SqliteInstanceRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Register a new instance and return its stored descriptor.
    pub async fn insert(&self, instance: NewInstance) -> DomainResult<InstanceDescriptor> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<InstanceDescriptor> {
            let conn = db.get_connection()?;
            let id = insert_instance(&conn, &instance)?;
            debug!(instance_id = id, kind = %instance.kind, "registered resource instance");
            query_by_id(&conn, id, instance.kind)?.ok_or_else(|| {
                OpsDeckError::Internal(format!("instance {id} vanished after insert"))
            })
        })
        .await
        .map_err(map_join_error)?
    }

    /// Replace the connection settings of an existing instance.
    ///
    /// Cached clients are not touched; callers invalidate them separately.
    pub async fn update_connection(
        &self,
        id: InstanceId,
        settings: ConnectionSettings,
    ) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE resource_instances
                     SET address = ?1, https_enabled = ?2, skip_tls_verify = ?3,
                         auth_config = ?4, updated_at = ?5
                     WHERE id = ?6",
                    params![
                        settings.address,
                        settings.https_enabled,
                        settings.skip_tls_verify,
                        settings.auth_config,
                        Utc::now().timestamp(),
                        to_sql_id(id)?,
                    ],
                )
                .map_err(map_sql_error)?;

            if changed == 0 {
                return Err(OpsDeckError::NotFound(format!("instance {id} not found")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    /// Delete an instance. Returns whether a row was removed.
    pub async fn delete(&self, id: InstanceId) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<bool> {
            let conn = db.get_connection()?;
            let removed = conn
                .execute("DELETE FROM resource_instances WHERE id = ?1", params![to_sql_id(id)?])
                .map_err(map_sql_error)?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_join_error)?
    }

    pub async fn find_by_id(
        &self,
        id: InstanceId,
        kind: ResourceKind,
    ) -> DomainResult<Option<InstanceDescriptor>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<InstanceDescriptor>> {
            let conn = db.get_connection()?;
            query_by_id(&conn, id, kind)
        })
        .await
        .map_err(map_join_error)?
    }

    /// All instances of `kind`, ordered by id.
    pub async fn find_all_by_kind(
        &self,
        kind: ResourceKind,
    ) -> DomainResult<Vec<InstanceDescriptor>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<InstanceDescriptor>> {
            let conn = db.get_connection()?;
            query_all_by_kind(&conn, kind)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl InstanceDescriptorStore for SqliteInstanceRepository {
    async fn find_by_id(
        &self,
        id: InstanceId,
        kind: ResourceKind,
    ) -> DomainResult<Option<InstanceDescriptor>> {
        Self::find_by_id(self, id, kind).await
    }

    async fn find_all_by_kind(&self, kind: ResourceKind) -> DomainResult<Vec<InstanceDescriptor>> {
        Self::find_all_by_kind(self, kind).await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn insert_instance(conn: &rusqlite::Connection, instance: &NewInstance) -> DomainResult<InstanceId> {
    let now = Utc::now().timestamp();
    conn.execute(
        "INSERT INTO resource_instances
            (name, resource_type, sub_type, address, https_enabled, skip_tls_verify,
             auth_config, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            instance.name,
            instance.kind.resource_type(),
            instance.kind.sub_type(),
            instance.address,
            instance.https_enabled,
            instance.skip_tls_verify,
            instance.auth_config,
            now,
        ],
    )
    .map_err(map_sql_error)?;

    from_sql_id(conn.last_insert_rowid())
}

fn query_by_id(
    conn: &rusqlite::Connection,
    id: InstanceId,
    kind: ResourceKind,
) -> DomainResult<Option<InstanceDescriptor>> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM resource_instances
         WHERE id = ?1 AND resource_type = ?2 AND sub_type = ?3"
    );

    conn.query_row(&sql, params![to_sql_id(id)?, kind.resource_type(), kind.sub_type()], map_row)
        .optional()
        .map_err(map_sql_error)?
        .transpose()
}

fn query_all_by_kind(
    conn: &rusqlite::Connection,
    kind: ResourceKind,
) -> DomainResult<Vec<InstanceDescriptor>> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM resource_instances
         WHERE resource_type = ?1 AND sub_type = ?2
         ORDER BY id"
    );

    let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![kind.resource_type(), kind.sub_type()], map_row)
        .map_err(map_sql_error)?;

    let mut descriptors = Vec::new();
    for row in rows {
        descriptors.push(row.map_err(map_sql_error)??);
    }
    Ok(descriptors)
}

/// Row mapping keeps domain failures (unknown kind, bad id) separate from
/// SQLite failures so they surface with the right error variant.
fn map_row(row: &Row<'_>) -> rusqlite::Result<DomainResult<InstanceDescriptor>> {
    let id: i64 = row.get(0)?;
    let name: String = row.get(1)?;
    let resource_type: String = row.get(2)?;
    let sub_type: String = row.get(3)?;
    let address: Option<String> = row.get(4)?;
    let https_enabled: Option<bool> = row.get(5)?;
    let skip_tls_verify: Option<bool> = row.get(6)?;
    let auth_config: String = row.get(7)?;
    let updated_at: i64 = row.get(8)?;

    let Some(kind) = ResourceKind::from_columns(&resource_type, &sub_type) else {
        return Ok(Err(OpsDeckError::Database(format!(
            "instance {id} has unknown kind {resource_type}/{sub_type}"
        ))));
    };

    Ok(from_sql_id(id).map(|id| InstanceDescriptor {
        id,
        name,
        kind,
        address,
        https_enabled,
        skip_tls_verify,
        auth_config,
        updated_at: timestamp_to_utc(updated_at),
    }))
}

fn timestamp_to_utc(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn to_sql_id(id: InstanceId) -> DomainResult<i64> {
    i64::try_from(id).map_err(|_| OpsDeckError::InvalidInput(format!("instance id {id} out of range")))
}

fn from_sql_id(id: i64) -> DomainResult<InstanceId> {
    InstanceId::try_from(id)
        .map_err(|_| OpsDeckError::Database(format!("negative instance id {id} in database")))
}

fn map_join_error(err: task::JoinError) -> OpsDeckError {
    if err.is_panic() {
        OpsDeckError::Internal("database task panicked".into())
    } else {
        OpsDeckError::Internal(format!("database task cancelled: {err}"))
    }
}
