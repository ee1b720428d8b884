//! The decider abstraction.

use crate::error::DomainError;

/// Pure decision logic for one aggregate.
///
/// `decide` turns a command into events (or rejects it), `evolve` folds one
/// event into the state. State is never stored directly: it is rebuilt by
/// folding `evolve` over the stream, starting from `initial_state`.
pub trait Decider: Send + Sync {
    /// Input to `decide`.
    type Command: Send + Sync + 'static;
    /// Derived projection of the stream.
    type State: Clone + Send + Sync + 'static;
    /// Immutable fact appended to the stream.
    type Event: Clone + Send + Sync + 'static;

    /// Decides which events a command produces against `state`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::RuleViolation` when the command is not valid for
    /// the given state.
    fn decide(
        &self,
        command: &Self::Command,
        state: &Self::State,
    ) -> Result<Vec<Self::Event>, DomainError>;

    /// Applies one event. Must be deterministic and total over every event
    /// the store can contain.
    fn evolve(&self, state: Self::State, event: &Self::Event) -> Self::State;

    /// The state of an empty stream.
    fn initial_state(&self) -> Self::State;

    /// Whether no further transition is possible from `state`.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Developer-assigned version of the state's shape.
    ///
    /// Bump it whenever `evolve` changes in a way that makes previously
    /// snapshotted states unusable.
    fn schema_version(&self) -> String {
        String::from("1")
    }

    /// Left-folds `evolve` over `events`, starting from `state`.
    fn fold<'a, I>(&self, state: Self::State, events: I) -> Self::State
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        events
            .into_iter()
            .fold(state, |state, event| self.evolve(state, event))
    }
}
