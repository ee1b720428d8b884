//! Handler starting from the latest snapshot.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use decider_core::{
    Decider, HandleError, SnapshotKey, SnapshotStore, StoreError, Version, VersionedEventStore,
    container_key,
};
use tracing::{debug, info, instrument, warn};

use crate::CommandHandler;
use crate::reconcile::decide_and_append;
use crate::retry::RetryPolicy;

/// When a handler writes a new snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPolicy {
    every: Option<NonZeroU32>,
}

impl Default for SnapshotPolicy {
    /// Snapshot after every successful append.
    fn default() -> Self {
        Self {
            every: Some(NonZeroU32::MIN),
        }
    }
}

impl SnapshotPolicy {
    /// Snapshot whenever an append crosses a multiple of `n` events.
    #[must_use]
    pub fn every(n: NonZeroU32) -> Self {
        Self { every: Some(n) }
    }

    /// Never write snapshots; existing ones are still read.
    #[must_use]
    pub fn never() -> Self {
        Self { every: None }
    }

    /// Whether an append moving the stream from `previous` to `current`
    /// calls for a snapshot.
    #[must_use]
    pub fn is_due(&self, previous: Version, current: Version) -> bool {
        self.every.is_some_and(|n| {
            let n = Version::from(n.get());
            current.div_euclid(n) > previous.div_euclid(n)
        })
    }
}

/// Loads the latest snapshot, replays the events after it, decides and
/// appends, then refreshes the snapshot.
///
/// A snapshot is only a cache: failing to write one is logged and the command
/// still succeeds.
pub struct SnapshotHandler<D: Decider> {
    decider: D,
    stream: String,
    store: Arc<dyn VersionedEventStore<D::Event>>,
    snapshots: Arc<dyn SnapshotStore<D::State>>,
    key: SnapshotKey,
    retry: RetryPolicy,
    policy: SnapshotPolicy,
}

impl<D: Decider> SnapshotHandler<D> {
    /// Creates a handler snapshotting `stream` outside any container.
    pub fn new(
        decider: D,
        stream: impl Into<String>,
        store: Arc<dyn VersionedEventStore<D::Event>>,
        snapshots: Arc<dyn SnapshotStore<D::State>>,
    ) -> Self {
        let stream = stream.into();
        let key = SnapshotKey::stream(&stream);
        Self {
            decider,
            stream,
            store,
            snapshots,
            key,
            retry: RetryPolicy::default(),
            policy: SnapshotPolicy::default(),
        }
    }

    /// Partitions snapshots by the decider's schema version, so that a
    /// changed state shape never reads snapshots written by an older one.
    #[must_use]
    pub fn with_container(mut self) -> Self {
        let container = container_key(&self.decider.schema_version());
        self.key = SnapshotKey::in_container(&self.stream, &container);
        self
    }

    /// Replaces the snapshot policy.
    #[must_use]
    pub fn with_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The key snapshots are read from and written to.
    pub fn snapshot_key(&self) -> &SnapshotKey {
        &self.key
    }

    async fn load_state(&self) -> Result<(Version, D::State), StoreError> {
        let (base_version, base_state) = match self.snapshots.try_load_snapshot(&self.key).await? {
            Some(snapshot) => (snapshot.version, snapshot.state),
            None => (0, self.decider.initial_state()),
        };
        let (version, events) = self.store.load_events(&self.stream, base_version).await?;
        debug!(
            base_version,
            version,
            replayed = events.len(),
            "rebuilt state from snapshot"
        );
        Ok((version, self.decider.fold(base_state, &events)))
    }
}

impl<D: Decider + Clone> Clone for SnapshotHandler<D> {
    fn clone(&self) -> Self {
        Self {
            decider: self.decider.clone(),
            stream: self.stream.clone(),
            store: Arc::clone(&self.store),
            snapshots: Arc::clone(&self.snapshots),
            key: self.key.clone(),
            retry: self.retry,
            policy: self.policy,
        }
    }
}

#[async_trait]
impl<D: Decider> CommandHandler<D> for SnapshotHandler<D> {
    #[instrument(skip_all, fields(stream = %self.stream))]
    async fn handle(&mut self, command: &D::Command) -> Result<Vec<D::Event>, HandleError> {
        let (version, state) = self.load_state().await?;
        let committed = decide_and_append(
            &self.decider,
            self.store.as_ref(),
            &self.stream,
            &self.retry,
            version,
            state,
            command,
        )
        .await?;

        if !committed.events.is_empty()
            && self
                .policy
                .is_due(committed.expected_version, committed.version)
        {
            match self
                .snapshots
                .save_snapshot(&self.key, committed.version, &committed.state)
                .await
            {
                Ok(()) => info!(version = committed.version, "saved snapshot"),
                Err(error) => warn!(%error, version = committed.version, "failed to save snapshot"),
            }
        }
        Ok(committed.events)
    }
}
