//! Multiplexes one decider over many independent keys in a single stream.

use std::collections::BTreeMap;

use crate::decider::Decider;
use crate::error::DomainError;

/// Lifts a single-entity decider to a map of entities.
///
/// Commands and events carry the key of the entity they target. Missing
/// entries behave as the inner decider's initial state, and an entry is
/// dropped from the map as soon as the inner decider reports it terminal, so
/// finished entities cost no memory even though their events stay in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyedMap<K, D> {
    inner: D,
    _key: std::marker::PhantomData<fn() -> K>,
}

impl<K, D> KeyedMap<K, D> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            _key: std::marker::PhantomData,
        }
    }
}

impl<K, D> Decider for KeyedMap<K, D>
where
    K: Ord + Clone + Send + Sync + 'static,
    D: Decider,
{
    type Command = (K, D::Command);
    type State = BTreeMap<K, D::State>;
    type Event = (K, D::Event);

    fn decide(
        &self,
        (key, command): &Self::Command,
        states: &Self::State,
    ) -> Result<Vec<Self::Event>, DomainError> {
        let events = match states.get(key) {
            Some(state) => self.inner.decide(command, state)?,
            None => self.inner.decide(command, &self.inner.initial_state())?,
        };
        Ok(events
            .into_iter()
            .map(|event| (key.clone(), event))
            .collect())
    }

    fn evolve(&self, mut states: Self::State, (key, event): &Self::Event) -> Self::State {
        let state = states
            .remove(key)
            .unwrap_or_else(|| self.inner.initial_state());
        let state = self.inner.evolve(state, event);
        if !self.inner.is_terminal(&state) {
            states.insert(key.clone(), state);
        }
        states
    }

    fn initial_state(&self) -> Self::State {
        BTreeMap::new()
    }

    fn is_terminal(&self, states: &Self::State) -> bool {
        states.values().all(|state| self.inner.is_terminal(state))
    }

    fn schema_version(&self) -> String {
        format!("map({})", self.inner.schema_version())
    }
}
