//! Handler keeping the folded state between calls.

use std::sync::Arc;

use async_trait::async_trait;
use decider_core::{Decider, HandleError, Version, VersionedEventStore};
use tracing::{info, instrument};

use crate::CommandHandler;
use crate::reconcile::decide_and_append;
use crate::retry::RetryPolicy;

/// Loads the stream once, then decides against the cached state.
///
/// Writes by other processes are discovered through append conflicts: the
/// catch-up events are folded into the cache and the command is decided
/// again. The cache is only replaced by the state the store confirmed, so a
/// failed or rejected command leaves it untouched.
pub struct CachedSession<D: Decider> {
    decider: D,
    stream: String,
    store: Arc<dyn VersionedEventStore<D::Event>>,
    retry: RetryPolicy,
    cache: Option<(Version, D::State)>,
}

impl<D: Decider> CachedSession<D> {
    /// Creates a session for `stream`. Nothing is loaded until the first
    /// command.
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
            cache: None,
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Version of the cached state, `None` before the first load.
    pub fn version(&self) -> Option<Version> {
        self.cache.as_ref().map(|(version, _)| *version)
    }

    /// The cached state, `None` before the first load.
    pub fn state(&self) -> Option<&D::State> {
        self.cache.as_ref().map(|(_, state)| state)
    }

    /// Drops the cache; the next command reloads the stream.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    async fn current(&mut self) -> Result<(Version, D::State), HandleError> {
        if let Some((version, state)) = &self.cache {
            return Ok((*version, state.clone()));
        }
        info!(stream = %self.stream, "initializing cached session");
        let (version, events) = self.store.load_events(&self.stream, 0).await?;
        let state = self.decider.fold(self.decider.initial_state(), &events);
        self.cache = Some((version, state.clone()));
        Ok((version, state))
    }
}

#[async_trait]
impl<D: Decider> CommandHandler<D> for CachedSession<D> {
    #[instrument(skip_all, fields(stream = %self.stream))]
    async fn handle(&mut self, command: &D::Command) -> Result<Vec<D::Event>, HandleError> {
        let (version, state) = self.current().await?;
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
        self.cache = Some((committed.version, committed.state));
        Ok(committed.events)
    }
}

#[cfg(test)]
mod tests {
    use decider_core::{DomainError, KeyedMap};
    use decider_samples::{
        Counter, CounterCommand, CounterEvent, CounterState, Todo, TodoCommand,
    };
    use decider_test_support::{InMemoryEventStore, RacingEventStore};

    use super::*;

    #[tokio::test]
    async fn test_stream_is_loaded_once() {
        let store = Arc::new(InMemoryEventStore::new());
        let mut session = CachedSession::new(Counter, "counter", store.clone());

        for _ in 0..5 {
            session.handle(&CounterCommand::Increment).await.unwrap();
        }

        assert_eq!(store.load_count(), 1);
        assert_eq!(session.version(), Some(5));
        assert_eq!(
            session.state(),
            Some(&CounterState {
                value: 5,
                actions_count: 5
            })
        );
    }

    #[tokio::test]
    async fn test_session_picks_up_existing_events() {
        let store = Arc::new(InMemoryEventStore::new());
        store
            .try_append_events(
                "counter",
                0,
                &[CounterEvent::Incremented, CounterEvent::Incremented],
            )
            .await
            .unwrap();
        let mut session = CachedSession::new(Counter, "counter", store.clone());

        session.handle(&CounterCommand::Decrement).await.unwrap();

        assert_eq!(session.version(), Some(3));
        assert_eq!(session.state().map(|state| state.value), Some(1));
    }

    #[tokio::test]
    async fn test_foreign_writes_are_folded_into_the_cache() {
        let inner = InMemoryEventStore::new();
        let store = Arc::new(RacingEventStore::new(
            inner,
            vec![CounterEvent::Incremented, CounterEvent::Incremented],
        ));
        let mut session = CachedSession::new(Counter, "counter", store.clone())
            .with_retry(RetryPolicy::immediate());

        session.handle(&CounterCommand::Increment).await.unwrap();

        assert_eq!(session.version(), Some(3));
        assert_eq!(session.state().map(|state| state.value), Some(3));
        assert_eq!(store.inner().load_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_command_keeps_the_cache() {
        let store = Arc::new(InMemoryEventStore::new());
        let mut session = CachedSession::new(KeyedMap::<String, _>::new(Todo), "todos", store.clone());

        session
            .handle(&(
                "1".to_owned(),
                TodoCommand::AddTodo {
                    name: "my new Todo".to_owned(),
                },
            ))
            .await
            .unwrap();
        let result = session
            .handle(&("2".to_owned(), TodoCommand::RemoveTodo))
            .await;

        assert!(matches!(
            result,
            Err(HandleError::Domain(DomainError::RuleViolation(_)))
        ));
        assert_eq!(session.version(), Some(1));
        assert_eq!(session.state().map(std::collections::BTreeMap::len), Some(1));
        assert_eq!(store.records("todos").len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_a_reload() {
        let store = Arc::new(InMemoryEventStore::new());
        let mut session = CachedSession::new(Counter, "counter", store.clone());

        session.handle(&CounterCommand::Increment).await.unwrap();
        session.invalidate();
        assert_eq!(session.version(), None);
        session.handle(&CounterCommand::Increment).await.unwrap();

        assert_eq!(store.load_count(), 2);
        assert_eq!(session.version(), Some(2));
    }
}
