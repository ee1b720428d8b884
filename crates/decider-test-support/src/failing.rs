//! Stores that always fail.

use async_trait::async_trait;
use decider_core::{
    AppendOutcome, SimpleEventStore, Snapshot, SnapshotKey, SnapshotStore, StoreError, Version,
    VersionedEventStore,
};
use futures::stream::BoxStream;

fn connection_refused() -> StoreError {
    StoreError::Database("connection refused".into())
}

/// A store whose every operation returns a database error. Useful for
/// testing error propagation through the handlers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

#[async_trait]
impl<E: Send + Sync + 'static> SimpleEventStore<E> for FailingStore {
    async fn load_events(&self, _stream: &str, _from_version: Version) -> Result<Vec<E>, StoreError> {
        Err(connection_refused())
    }

    async fn append_events(&self, _stream: &str, _events: &[E]) -> Result<(), StoreError> {
        Err(connection_refused())
    }
}

#[async_trait]
impl<E: Send + Sync + 'static> VersionedEventStore<E> for FailingStore {
    async fn load_events(
        &self,
        _stream: &str,
        _after_version: Version,
    ) -> Result<(Version, Vec<E>), StoreError> {
        Err(connection_refused())
    }

    async fn stream_events<'a>(
        &'a self,
        _stream: &'a str,
        _after_version: Version,
    ) -> Result<(Version, BoxStream<'a, Result<E, StoreError>>), StoreError> {
        Err(connection_refused())
    }

    async fn try_append_events(
        &self,
        _stream: &str,
        _expected_version: Version,
        _events: &[E],
    ) -> Result<AppendOutcome<E>, StoreError> {
        Err(connection_refused())
    }
}

#[async_trait]
impl<S: Send + Sync + 'static> SnapshotStore<S> for FailingStore {
    async fn try_load_snapshot(&self, _key: &SnapshotKey) -> Result<Option<Snapshot<S>>, StoreError> {
        Err(connection_refused())
    }

    async fn save_snapshot(
        &self,
        _key: &SnapshotKey,
        _version: Version,
        _state: &S,
    ) -> Result<(), StoreError> {
        Err(connection_refused())
    }
}
