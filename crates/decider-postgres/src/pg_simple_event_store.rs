//! `PostgreSQL` implementation of `SimpleEventStore`.

use async_trait::async_trait;
use decider_core::{JsonSerializer, Serializer, SimpleEventStore, StoreError, Version};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::PgPool;

use crate::rows::{self, BodyRow, db_error};
use crate::schema;

/// PostgreSQL-backed store without optimistic concurrency.
///
/// An append computes its versions from the last version it reads, so two
/// concurrent appends on one stream make one of them fail on the
/// `(stream, version)` unique constraint.
#[derive(Debug, Clone)]
pub struct PgSimpleEventStore<S = JsonSerializer> {
    pool: PgPool,
    serializer: S,
}

impl PgSimpleEventStore {
    /// Creates a store encoding events as JSON.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_serializer(pool, JsonSerializer)
    }
}

impl<S: Serializer> PgSimpleEventStore<S> {
    /// Creates a store encoding events with `serializer`.
    #[must_use]
    pub fn with_serializer(pool: PgPool, serializer: S) -> Self {
        Self { pool, serializer }
    }
}

#[async_trait]
impl<E, S> SimpleEventStore<E> for PgSimpleEventStore<S>
where
    E: Serialize + DeserializeOwned + Send + Sync + 'static,
    S: Serializer,
{
    async fn load_events(&self, stream: &str, from_version: Version) -> Result<Vec<E>, StoreError> {
        let rows = sqlx::query_as::<_, BodyRow>(schema::SELECT_EVENTS_FROM)
            .bind(stream)
            .bind(from_version)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| self.serializer.deserialize(&row.body))
            .collect()
    }

    async fn append_events(&self, stream: &str, events: &[E]) -> Result<(), StoreError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let last_version = rows::last_version(&mut *tx, stream).await?;
        let records = rows::encode(&self.serializer, stream, last_version, events)?;
        rows::insert_events(&mut *tx, stream, records)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;

        tracing::debug!(stream, count = events.len(), "appended events");
        Ok(())
    }
}
