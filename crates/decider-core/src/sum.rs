//! Sum of two deciders routed by a tagged command.

use serde::{Deserialize, Serialize};

use crate::decider::Decider;
use crate::error::DomainError;

/// Closed two-way tagged union used for the commands and events of [`Sum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Either<L, R> {
    /// Routed to the left decider.
    Left(L),
    /// Routed to the right decider.
    Right(R),
}

/// Hosts two unrelated deciders in one stream.
///
/// A `Left` command is decided by the left decider alone and produces `Left`
/// events; `Right` works the same way. The state holds both sub-states.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum<A, B> {
    left: A,
    right: B,
}

impl<A, B> Sum<A, B> {
    /// Combines `left` and `right`.
    #[must_use]
    pub fn new(left: A, right: B) -> Self {
        Self { left, right }
    }
}

impl<A, B> Decider for Sum<A, B>
where
    A: Decider,
    B: Decider,
{
    type Command = Either<A::Command, B::Command>;
    type State = (A::State, B::State);
    type Event = Either<A::Event, B::Event>;

    fn decide(
        &self,
        command: &Self::Command,
        (left, right): &Self::State,
    ) -> Result<Vec<Self::Event>, DomainError> {
        match command {
            Either::Left(command) => Ok(self
                .left
                .decide(command, left)?
                .into_iter()
                .map(Either::Left)
                .collect()),
            Either::Right(command) => Ok(self
                .right
                .decide(command, right)?
                .into_iter()
                .map(Either::Right)
                .collect()),
        }
    }

    fn evolve(&self, (left, right): Self::State, event: &Self::Event) -> Self::State {
        match event {
            Either::Left(event) => (self.left.evolve(left, event), right),
            Either::Right(event) => (left, self.right.evolve(right, event)),
        }
    }

    fn initial_state(&self) -> Self::State {
        (self.left.initial_state(), self.right.initial_state())
    }

    fn is_terminal(&self, (left, right): &Self::State) -> bool {
        self.left.is_terminal(left) && self.right.is_terminal(right)
    }

    fn schema_version(&self) -> String {
        format!(
            "{}+{}",
            self.left.schema_version(),
            self.right.schema_version()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Switch that can be turned on once.
    struct Switch;

    impl Decider for Switch {
        type Command = ();
        type State = bool;
        type Event = ();

        fn decide(&self, _command: &(), state: &bool) -> Result<Vec<()>, DomainError> {
            if *state {
                return Err(DomainError::rule("already on"));
            }
            Ok(vec![()])
        }

        fn evolve(&self, _state: bool, _event: &()) -> bool {
            true
        }

        fn initial_state(&self) -> bool {
            false
        }

        fn is_terminal(&self, state: &bool) -> bool {
            *state
        }
    }

    /// Appends words to a sentence.
    struct Sentence;

    impl Decider for Sentence {
        type Command = String;
        type State = Vec<String>;
        type Event = String;

        fn decide(&self, command: &String, _state: &Vec<String>) -> Result<Vec<String>, DomainError> {
            Ok(vec![command.clone()])
        }

        fn evolve(&self, mut state: Vec<String>, event: &String) -> Vec<String> {
            state.push(event.clone());
            state
        }

        fn initial_state(&self) -> Vec<String> {
            Vec::new()
        }

        fn is_terminal(&self, _state: &Vec<String>) -> bool {
            false
        }
    }

    #[test]
    fn test_left_command_is_decided_by_left_decider_only() {
        let sum = Sum::new(Switch, Sentence);

        let events = sum.decide(&Either::Left(()), &sum.initial_state()).unwrap();

        assert_eq!(events, vec![Either::Left(())]);
    }

    #[test]
    fn test_right_command_is_decided_by_right_decider_only() {
        let sum = Sum::new(Switch, Sentence);
        let state = (true, Vec::new());

        let events = sum.decide(&Either::Right("hello".to_owned()), &state).unwrap();

        assert_eq!(events, vec![Either::Right("hello".to_owned())]);
    }

    #[test]
    fn test_rejection_of_the_routed_decider_propagates() {
        let sum = Sum::new(Switch, Sentence);
        let state = (true, Vec::new());

        let result = sum.decide(&Either::Left(()), &state);

        assert_eq!(result, Err(DomainError::rule("already on")));
    }

    #[test]
    fn test_evolve_touches_only_the_tagged_state() {
        let sum = Sum::new(Switch, Sentence);

        let state = sum.fold(
            sum.initial_state(),
            &[Either::Right("a".to_owned()), Either::Right("b".to_owned())],
        );

        assert_eq!(state, (false, vec!["a".to_owned(), "b".to_owned()]));

        let state = sum.evolve(state, &Either::Left(()));
        assert!(state.0);
        assert_eq!(state.1.len(), 2);
    }

    #[test]
    fn test_either_serializes_with_its_tag() {
        let event: Either<(), String> = Either::Right("x".to_owned());

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json, serde_json::json!({"Right": "x"}));
    }
}
