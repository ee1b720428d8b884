//! `PostgreSQL` implementation of `SnapshotStore`.

use async_trait::async_trait;
use decider_core::{JsonSerializer, Serializer, Snapshot, SnapshotKey, SnapshotStore, StoreError, Version};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::PgPool;

use crate::rows::{BodyRow, db_error};
use crate::schema;

/// PostgreSQL-backed snapshot store, one row per `(stream, container)`.
///
/// Snapshots without a container are stored under the empty container name.
#[derive(Debug, Clone)]
pub struct PgSnapshotStore<S = JsonSerializer> {
    pool: PgPool,
    serializer: S,
}

impl PgSnapshotStore {
    /// Creates a store encoding states as JSON.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_serializer(pool, JsonSerializer)
    }
}

impl<S: Serializer> PgSnapshotStore<S> {
    /// Creates a store encoding states with `serializer`.
    #[must_use]
    pub fn with_serializer(pool: PgPool, serializer: S) -> Self {
        Self { pool, serializer }
    }
}

fn container(key: &SnapshotKey) -> &str {
    key.container.as_deref().unwrap_or_default()
}

#[async_trait]
impl<T, S> SnapshotStore<T> for PgSnapshotStore<S>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    S: Serializer,
{
    async fn try_load_snapshot(&self, key: &SnapshotKey) -> Result<Option<Snapshot<T>>, StoreError> {
        let row = sqlx::query_as::<_, BodyRow>(schema::SELECT_SNAPSHOT)
            .bind(&key.stream)
            .bind(container(key))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(Snapshot {
            version: row.version,
            state: self.serializer.deserialize(&row.body)?,
        }))
    }

    async fn save_snapshot(
        &self,
        key: &SnapshotKey,
        version: Version,
        state: &T,
    ) -> Result<(), StoreError> {
        let body = self.serializer.serialize(state)?;
        let result = sqlx::query(schema::UPSERT_SNAPSHOT)
            .bind(&key.stream)
            .bind(container(key))
            .bind(version)
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            tracing::debug!(stream = %key.stream, version, "kept newer snapshot");
        }
        Ok(())
    }
}
