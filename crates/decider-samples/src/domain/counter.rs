//! Bounded counter.

use decider_core::{Decider, DomainError};
use serde::{Deserialize, Serialize};

/// Highest value the counter may reach.
pub const MAX_VALUE: u32 = 1000;

/// Number of actions after which the counter refuses every command.
pub const MAX_ACTIONS: u64 = 1_000_000;

/// Commands accepted by the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterCommand {
    /// Add one.
    Increment,
    /// Remove one.
    Decrement,
}

/// Events emitted by the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterEvent {
    /// The value went up by one.
    Incremented,
    /// The value went down by one.
    Decremented,
}

/// Folded counter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CounterState {
    /// Current value, between 0 and [`MAX_VALUE`].
    pub value: u32,
    /// Number of events applied so far.
    pub actions_count: u64,
}

/// Counter that stays within `0..=MAX_VALUE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counter;

impl Decider for Counter {
    type Command = CounterCommand;
    type State = CounterState;
    type Event = CounterEvent;

    fn decide(
        &self,
        command: &CounterCommand,
        state: &CounterState,
    ) -> Result<Vec<CounterEvent>, DomainError> {
        if state.actions_count >= MAX_ACTIONS {
            return Err(DomainError::rule("counter reached max actions"));
        }
        match command {
            CounterCommand::Increment if state.value >= MAX_VALUE => {
                Err(DomainError::rule("counter reached max value"))
            }
            CounterCommand::Decrement if state.value == 0 => {
                Err(DomainError::rule("counter reached min value"))
            }
            CounterCommand::Increment => Ok(vec![CounterEvent::Incremented]),
            CounterCommand::Decrement => Ok(vec![CounterEvent::Decremented]),
        }
    }

    fn evolve(&self, state: CounterState, event: &CounterEvent) -> CounterState {
        let value = match event {
            CounterEvent::Incremented => state.value.saturating_add(1),
            CounterEvent::Decremented => state.value.saturating_sub(1),
        };
        CounterState {
            value,
            actions_count: state.actions_count.saturating_add(1),
        }
    }

    fn initial_state(&self) -> CounterState {
        CounterState::default()
    }

    fn is_terminal(&self, _state: &CounterState) -> bool {
        false
    }
}
