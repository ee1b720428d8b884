//! `PostgreSQL` implementation of `VersionedEventStore`.

use async_trait::async_trait;
use decider_core::{
    AppendOutcome, JsonSerializer, Serializer, StoreError, Version, VersionedEventStore,
    store::version_span,
};
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use tracing::debug;

use crate::rows::{self, BodyRow, db_error, is_unique_violation};
use crate::schema;

/// PostgreSQL-backed store with conditional appends.
///
/// Reads first capture the stream's last version and then only return events
/// up to it, so the version handed back always matches the events folded by
/// the caller even while other writers append.
#[derive(Debug, Clone)]
pub struct PgEventStore<S = JsonSerializer> {
    pool: PgPool,
    serializer: S,
}

impl PgEventStore {
    /// Creates a store encoding events as JSON.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_serializer(pool, JsonSerializer)
    }
}

impl<S: Serializer> PgEventStore<S> {
    /// Creates a store encoding events with `serializer`.
    #[must_use]
    pub fn with_serializer(pool: PgPool, serializer: S) -> Self {
        Self { pool, serializer }
    }

    async fn read_after<E: DeserializeOwned>(
        &self,
        stream: &str,
        after_version: Version,
    ) -> Result<(Version, Vec<E>), StoreError> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        let last_version = rows::last_version(&mut *conn, stream).await?;
        let rows = sqlx::query_as::<_, BodyRow>(schema::SELECT_EVENTS_BETWEEN)
            .bind(stream)
            .bind(after_version)
            .bind(last_version)
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error)?;

        let events = rows
            .iter()
            .map(|row| self.serializer.deserialize(&row.body))
            .collect::<Result<Vec<E>, StoreError>>()?;
        Ok((last_version, events))
    }

    async fn conflict<E: DeserializeOwned>(
        &self,
        stream: &str,
        expected_version: Version,
    ) -> Result<AppendOutcome<E>, StoreError> {
        let (actual_version, catch_up) = self.read_after(stream, expected_version).await?;
        debug!(
            stream,
            expected_version,
            actual_version,
            "append rejected, stream has moved on"
        );
        Ok(AppendOutcome::Conflict {
            actual_version,
            catch_up,
        })
    }
}

#[async_trait]
impl<E, S> VersionedEventStore<E> for PgEventStore<S>
where
    E: Serialize + DeserializeOwned + Send + Sync + 'static,
    S: Serializer,
{
    async fn load_events(
        &self,
        stream: &str,
        after_version: Version,
    ) -> Result<(Version, Vec<E>), StoreError> {
        self.read_after(stream, after_version).await
    }

    async fn stream_events<'a>(
        &'a self,
        stream: &'a str,
        after_version: Version,
    ) -> Result<(Version, BoxStream<'a, Result<E, StoreError>>), StoreError> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        let last_version = rows::last_version(&mut *conn, stream).await?;
        drop(conn);

        let serializer = &self.serializer;
        let events = sqlx::query_as::<_, BodyRow>(schema::SELECT_EVENTS_BETWEEN)
            .bind(stream)
            .bind(after_version)
            .bind(last_version)
            .fetch(&self.pool)
            .map(move |row| {
                row.map_err(db_error)
                    .and_then(|row| serializer.deserialize(&row.body))
            })
            .boxed();
        Ok((last_version, events))
    }

    async fn try_append_events(
        &self,
        stream: &str,
        expected_version: Version,
        events: &[E],
    ) -> Result<AppendOutcome<E>, StoreError> {
        if events.is_empty() {
            return Ok(AppendOutcome::Appended(expected_version));
        }
        let span = version_span(events.len())?;
        let records = rows::encode(&self.serializer, stream, expected_version, events)?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let last_version = rows::last_version(&mut *tx, stream).await?;
        if last_version > expected_version {
            tx.rollback().await.map_err(db_error)?;
            return self.conflict(stream, expected_version).await;
        }
        if last_version < expected_version {
            tx.rollback().await.map_err(db_error)?;
            return Err(StoreError::VersionAhead {
                stream: stream.to_owned(),
                expected: expected_version,
                actual: last_version,
            });
        }

        match rows::insert_events(&mut *tx, stream, records).await {
            Ok(()) => {}
            Err(error) if is_unique_violation(&error) => {
                tx.rollback().await.map_err(db_error)?;
                return self.conflict(stream, expected_version).await;
            }
            Err(error) => return Err(db_error(error)),
        }
        tx.commit().await.map_err(db_error)?;

        Ok(AppendOutcome::Appended(expected_version + span))
    }
}
