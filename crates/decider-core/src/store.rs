//! Event store contracts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::error::StoreError;

/// Position of the last event in a stream. `0` is an empty stream.
pub type Version = i64;

/// Stored representation of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Stream this event belongs to.
    pub stream: String,
    /// Position within the stream, starting at 1.
    pub version: Version,
    /// Serialized event body.
    pub body: Vec<u8>,
    /// When the store accepted the event.
    pub recorded_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Builds a record for a freshly appended event.
    #[must_use]
    pub fn new(stream: &str, version: Version, body: Vec<u8>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            stream: stream.to_owned(),
            version,
            body,
            recorded_at: Utc::now(),
        }
    }
}

/// Result of a conditional append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome<E> {
    /// The events were written; carries the stream's new version.
    Appended(Version),
    /// Another writer got there first.
    Conflict {
        /// The stream's last version at the time of the conflict.
        actual_version: Version,
        /// Every event after the caller's expected version, in order.
        catch_up: Vec<E>,
    },
}

/// Baseline store without optimistic concurrency.
///
/// `append_events` reads the current last version and then writes after it,
/// so two concurrent writers can collide on the same version. Only suitable
/// for a single writer per stream.
#[async_trait]
pub trait SimpleEventStore<E>: Send + Sync {
    /// Loads the events of `stream` whose version is at least `from_version`.
    async fn load_events(&self, stream: &str, from_version: Version) -> Result<Vec<E>, StoreError>;

    /// Appends `events` after the current last version of `stream`.
    async fn append_events(&self, stream: &str, events: &[E]) -> Result<(), StoreError>;
}

/// Store with conditional appends.
#[async_trait]
pub trait VersionedEventStore<E>: Send + Sync {
    /// Loads the events of `stream` strictly after `after_version`, together
    /// with the stream's last version.
    async fn load_events(
        &self,
        stream: &str,
        after_version: Version,
    ) -> Result<(Version, Vec<E>), StoreError>;

    /// Same contract as [`load_events`](Self::load_events) without buffering
    /// the events.
    async fn stream_events<'a>(
        &'a self,
        stream: &'a str,
        after_version: Version,
    ) -> Result<(Version, BoxStream<'a, Result<E, StoreError>>), StoreError>;

    /// Appends `events` as versions `expected_version + 1 ..` in one atomic
    /// write.
    ///
    /// If any of those versions already exists nothing is written and the
    /// events already stored after `expected_version` are returned instead.
    async fn try_append_events(
        &self,
        stream: &str,
        expected_version: Version,
        events: &[E],
    ) -> Result<AppendOutcome<E>, StoreError>;
}

/// Converts a slice length into a version delta.
///
/// # Errors
///
/// Returns `StoreError::Database` if the batch cannot be addressed with a
/// `Version`.
pub fn version_span(len: usize) -> Result<Version, StoreError> {
    Version::try_from(len)
        .map_err(|_| StoreError::Database(format!("cannot append {len} events in one batch")))
}
