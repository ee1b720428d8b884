//! Row types and statements shared by the event stores.

use chrono::{DateTime, Utc};
use decider_core::{Serializer, StoreError, StoredEvent, Version};
use serde::Serialize;
use sqlx::{PgConnection, Postgres};
use uuid::Uuid;

use crate::schema;

/// A `(version, body)` row of the `events` or `snapshots` table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BodyRow {
    pub version: Version,
    pub body: Vec<u8>,
}

pub(crate) fn db_error(error: sqlx::Error) -> StoreError {
    StoreError::Database(error.to_string())
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db_error| db_error.is_unique_violation())
}

/// Serializes `events` into records numbered after `after_version`.
pub(crate) fn encode<E: Serialize, S: Serializer>(
    serializer: &S,
    stream: &str,
    after_version: Version,
    events: &[E],
) -> Result<Vec<StoredEvent>, StoreError> {
    events
        .iter()
        .zip(after_version + 1..)
        .map(|(event, version)| Ok(StoredEvent::new(stream, version, serializer.serialize(event)?)))
        .collect()
}

pub(crate) async fn last_version(
    conn: &mut PgConnection,
    stream: &str,
) -> Result<Version, StoreError> {
    sqlx::query_scalar::<Postgres, Version>(schema::SELECT_LAST_VERSION)
        .bind(stream)
        .fetch_one(conn)
        .await
        .map_err(db_error)
}

/// Writes a batch of records belonging to `stream`.
pub(crate) async fn insert_events(
    conn: &mut PgConnection,
    stream: &str,
    records: Vec<StoredEvent>,
) -> Result<(), sqlx::Error> {
    let len = records.len();
    let mut event_ids: Vec<Uuid> = Vec::with_capacity(len);
    let mut versions: Vec<Version> = Vec::with_capacity(len);
    let mut bodies: Vec<Vec<u8>> = Vec::with_capacity(len);
    let mut recorded_at: Vec<DateTime<Utc>> = Vec::with_capacity(len);
    for record in records {
        event_ids.push(record.event_id);
        versions.push(record.version);
        bodies.push(record.body);
        recorded_at.push(record.recorded_at);
    }

    sqlx::query(schema::INSERT_EVENTS)
        .bind(stream)
        .bind(&event_ids)
        .bind(&versions)
        .bind(&bodies)
        .bind(&recorded_at)
        .execute(conn)
        .await?;
    Ok(())
}
