//! In-memory event store implementing both store tiers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use decider_core::store::version_span;
use decider_core::{
    AppendOutcome, JsonSerializer, Serializer, SimpleEventStore, StoreError, StoredEvent, Version,
    VersionedEventStore,
};
use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Event store keeping serialized records per stream in memory.
///
/// Enforces the same `(stream, version)` uniqueness a database index would,
/// and yields to the runtime before each write so concurrent handlers
/// genuinely interleave.
#[derive(Debug, Default)]
pub struct InMemoryEventStore<S = JsonSerializer> {
    streams: Mutex<HashMap<String, Vec<StoredEvent>>>,
    serializer: S,
    loads: AtomicUsize,
}

impl InMemoryEventStore {
    /// Creates an empty store encoding events as JSON.
    #[must_use]
    pub fn new() -> Self {
        Self::with_serializer(JsonSerializer)
    }
}

impl<S: Serializer> InMemoryEventStore<S> {
    /// Creates an empty store using `serializer`.
    #[must_use]
    pub fn with_serializer(serializer: S) -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            serializer,
            loads: AtomicUsize::new(0),
        }
    }

    /// Returns a copy of the records stored for `stream`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn records(&self, stream: &str) -> Vec<StoredEvent> {
        self.streams
            .lock()
            .unwrap()
            .get(stream)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of load calls served so far, streaming reads included.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn decode_after<E: DeserializeOwned>(
        &self,
        stream: &str,
        after_version: Version,
    ) -> Result<(Version, Vec<E>), StoreError> {
        let streams = self.streams.lock().unwrap();
        let records = streams.get(stream).map(Vec::as_slice).unwrap_or_default();
        let last_version = records.last().map_or(0, |record| record.version);
        let events = records
            .iter()
            .filter(|record| record.version > after_version)
            .map(|record| self.serializer.deserialize(&record.body))
            .collect::<Result<Vec<E>, StoreError>>()?;
        Ok((last_version, events))
    }

    fn encode<E: Serialize>(
        &self,
        stream: &str,
        after_version: Version,
        events: &[E],
    ) -> Result<Vec<StoredEvent>, StoreError> {
        events
            .iter()
            .zip(after_version + 1..)
            .map(|(event, version)| {
                Ok(StoredEvent::new(
                    stream,
                    version,
                    self.serializer.serialize(event)?,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl<E, S> SimpleEventStore<E> for InMemoryEventStore<S>
where
    E: Serialize + DeserializeOwned + Send + Sync + 'static,
    S: Serializer,
{
    async fn load_events(&self, stream: &str, from_version: Version) -> Result<Vec<E>, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let (_, events) = self.decode_after(stream, from_version - 1)?;
        Ok(events)
    }

    async fn append_events(&self, stream: &str, events: &[E]) -> Result<(), StoreError> {
        let last_version = {
            let streams = self.streams.lock().unwrap();
            streams
                .get(stream)
                .and_then(|records| records.last())
                .map_or(0, |record| record.version)
        };
        let records = self.encode(stream, last_version, events)?;
        tokio::task::yield_now().await;

        let mut streams = self.streams.lock().unwrap();
        let stored = streams.entry(stream.to_owned()).or_default();
        if stored.last().is_some_and(|record| record.version > last_version) {
            return Err(StoreError::Database(format!(
                "duplicate key value violates unique constraint on ({stream}, {})",
                last_version + 1
            )));
        }
        stored.extend(records);
        Ok(())
    }
}

#[async_trait]
impl<E, S> VersionedEventStore<E> for InMemoryEventStore<S>
where
    E: Serialize + DeserializeOwned + Send + Sync + 'static,
    S: Serializer,
{
    async fn load_events(
        &self,
        stream: &str,
        after_version: Version,
    ) -> Result<(Version, Vec<E>), StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.decode_after(stream, after_version)
    }

    async fn stream_events<'a>(
        &'a self,
        stream: &'a str,
        after_version: Version,
    ) -> Result<(Version, BoxStream<'a, Result<E, StoreError>>), StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let (last_version, events) = self.decode_after(stream, after_version)?;
        Ok((last_version, stream::iter(events.into_iter().map(Ok)).boxed()))
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
        let records = self.encode(stream, expected_version, events)?;
        tokio::task::yield_now().await;

        let last_version = {
            let mut streams = self.streams.lock().unwrap();
            let stored = streams.entry(stream.to_owned()).or_default();
            let last_version = stored.last().map_or(0, |record| record.version);
            if last_version == expected_version {
                stored.extend(records);
                return Ok(AppendOutcome::Appended(
                    expected_version + version_span(events.len())?,
                ));
            }
            last_version
        };

        if last_version < expected_version {
            return Err(StoreError::VersionAhead {
                stream: stream.to_owned(),
                expected: expected_version,
                actual: last_version,
            });
        }
        let (actual_version, catch_up) = self.decode_after(stream, expected_version)?;
        Ok(AppendOutcome::Conflict {
            actual_version,
            catch_up,
        })
    }
}
