//! Handler with optimistic concurrency.

use std::sync::Arc;

use async_trait::async_trait;
use decider_core::{Decider, HandleError, StoreError, Version, VersionedEventStore};
use futures::TryStreamExt;
use tracing::instrument;

use crate::CommandHandler;
use crate::reconcile::decide_and_append;
use crate::retry::RetryPolicy;

/// Replays the stream for every command, then appends conditionally on the
/// version it replayed up to. Conflicts are resolved by deciding the same
/// command again against the caught-up state.
pub struct VersionedHandler<D: Decider> {
    decider: D,
    stream: String,
    store: Arc<dyn VersionedEventStore<D::Event>>,
    retry: RetryPolicy,
}

impl<D: Decider> VersionedHandler<D> {
    /// Creates a handler for `stream` with the default retry policy.
    pub fn new(
        decider: D,
        stream: impl Into<String>,
        store: Arc<dyn VersionedEventStore<D::Event>>,
    ) -> Self {
        Self {
            decider,
            stream: stream.into(),
            store,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Folds the whole stream without buffering it.
    async fn load_state(&self) -> Result<(Version, D::State), StoreError> {
        let (version, mut events) = self.store.stream_events(&self.stream, 0).await?;
        let mut state = self.decider.initial_state();
        while let Some(event) = events.try_next().await? {
            state = self.decider.evolve(state, &event);
        }
        Ok((version, state))
    }
}

impl<D: Decider + Clone> Clone for VersionedHandler<D> {
    fn clone(&self) -> Self {
        Self {
            decider: self.decider.clone(),
            stream: self.stream.clone(),
            store: Arc::clone(&self.store),
            retry: self.retry,
        }
    }
}

#[async_trait]
impl<D: Decider> CommandHandler<D> for VersionedHandler<D> {
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
        Ok(committed.events)
    }
}
