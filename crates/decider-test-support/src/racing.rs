//! Store that lets a rival writer win the first append race.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use decider_core::{AppendOutcome, StoreError, Version, VersionedEventStore};
use futures::stream::BoxStream;

/// Wraps a versioned store and, right before the first conditional append,
/// appends `rival` events at the same expected version.
///
/// The wrapped caller therefore always sees one conflict carrying exactly the
/// rival events, which makes the reconciliation path deterministic to test.
#[derive(Debug)]
pub struct RacingEventStore<E, T> {
    inner: T,
    rival: Mutex<Option<Vec<E>>>,
    attempts: AtomicUsize,
}

impl<E, T> RacingEventStore<E, T> {
    /// Wraps `inner`; `rival` is written once, ahead of the first append.
    #[must_use]
    pub fn new(inner: T, rival: Vec<E>) -> Self {
        Self {
            inner,
            rival: Mutex::new(Some(rival)),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of `try_append_events` calls made by the caller.
    pub fn append_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The wrapped store.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<E, T> VersionedEventStore<E> for RacingEventStore<E, T>
where
    E: Send + Sync + 'static,
    T: VersionedEventStore<E>,
{
    async fn load_events(
        &self,
        stream: &str,
        after_version: Version,
    ) -> Result<(Version, Vec<E>), StoreError> {
        self.inner.load_events(stream, after_version).await
    }

    async fn stream_events<'a>(
        &'a self,
        stream: &'a str,
        after_version: Version,
    ) -> Result<(Version, BoxStream<'a, Result<E, StoreError>>), StoreError> {
        self.inner.stream_events(stream, after_version).await
    }

    async fn try_append_events(
        &self,
        stream: &str,
        expected_version: Version,
        events: &[E],
    ) -> Result<AppendOutcome<E>, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let rival = self.rival.lock().unwrap().take();
        if let Some(rival) = rival {
            self.inner
                .try_append_events(stream, expected_version, &rival)
                .await?;
        }
        self.inner
            .try_append_events(stream, expected_version, events)
            .await
    }
}
