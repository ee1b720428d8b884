//! Handler over the simple store.

use std::sync::Arc;

use async_trait::async_trait;
use decider_core::{Decider, HandleError, SimpleEventStore};
use tracing::instrument;

use crate::CommandHandler;

/// Reloads the whole stream for every command and appends without any
/// version check.
///
/// Two concurrent handlers on the same stream can both decide against the
/// same state; only use it where a single writer per stream is guaranteed.
pub struct StatelessHandler<D: Decider> {
    decider: D,
    stream: String,
    store: Arc<dyn SimpleEventStore<D::Event>>,
}

impl<D: Decider> StatelessHandler<D> {
    /// Creates a handler for `stream`.
    pub fn new(decider: D, stream: impl Into<String>, store: Arc<dyn SimpleEventStore<D::Event>>) -> Self {
        Self {
            decider,
            stream: stream.into(),
            store,
        }
    }
}

impl<D: Decider + Clone> Clone for StatelessHandler<D> {
    fn clone(&self) -> Self {
        Self {
            decider: self.decider.clone(),
            stream: self.stream.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

#[async_trait]
impl<D: Decider> CommandHandler<D> for StatelessHandler<D> {
    #[instrument(skip_all, fields(stream = %self.stream))]
    async fn handle(&mut self, command: &D::Command) -> Result<Vec<D::Event>, HandleError> {
        let past_events = self.store.load_events(&self.stream, 0).await?;
        let state = self
            .decider
            .fold(self.decider.initial_state(), &past_events);

        let events = self.decider.decide(command, &state)?;
        if !events.is_empty() {
            self.store.append_events(&self.stream, &events).await?;
        }
        Ok(events)
    }
}
