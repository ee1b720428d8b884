//! Product of two deciders sharing commands and events.

use crate::decider::Decider;
use crate::error::DomainError;

/// Runs two independent deciders against the same command and event stream.
///
/// Both sides see every command and every event; each keeps its own state.
/// Used to enforce a second invariant (a cap on the number of entities, say)
/// next to the main aggregate without touching its code.
#[derive(Debug, Clone, Copy, Default)]
pub struct Product<A, B> {
    left: A,
    right: B,
}

impl<A, B> Product<A, B> {
    /// Combines `left` and `right`.
    #[must_use]
    pub fn new(left: A, right: B) -> Self {
        Self { left, right }
    }
}

impl<A, B> Decider for Product<A, B>
where
    A: Decider,
    B: Decider<Command = A::Command, Event = A::Event>,
{
    type Command = A::Command;
    type State = (A::State, B::State);
    type Event = A::Event;

    fn decide(
        &self,
        command: &Self::Command,
        (left, right): &Self::State,
    ) -> Result<Vec<Self::Event>, DomainError> {
        let mut events = self.left.decide(command, left)?;
        events.extend(self.right.decide(command, right)?);
        Ok(events)
    }

    fn evolve(&self, (left, right): Self::State, event: &Self::Event) -> Self::State {
        (self.left.evolve(left, event), self.right.evolve(right, event))
    }

    fn initial_state(&self) -> Self::State {
        (self.left.initial_state(), self.right.initial_state())
    }

    fn is_terminal(&self, (left, right): &Self::State) -> bool {
        self.left.is_terminal(left) && self.right.is_terminal(right)
    }

    fn schema_version(&self) -> String {
        format!(
            "{}*{}",
            self.left.schema_version(),
            self.right.schema_version()
        )
    }
}
