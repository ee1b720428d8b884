//! Caps the number of todos in a todo list.
//!
//! Meant to be combined with [`TodoList`](super::todo_list::TodoList) through
//! [`Product`](decider_core::Product): it shares the list's commands and
//! events but never emits events of its own.

use decider_core::{Decider, DomainError};
use serde::{Deserialize, Serialize};

use super::todo_list::{TodoListCommand, TodoListEvent};

/// Largest number of live todos.
pub const MAX_TODOS: u32 = 10;

/// Number of live todos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TodoCounterState {
    /// Todos added and not yet removed.
    pub todos: u32,
}

/// Rejects `AddTodo` once [`MAX_TODOS`] todos exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodoCounter;

impl Decider for TodoCounter {
    type Command = TodoListCommand;
    type State = TodoCounterState;
    type Event = TodoListEvent;

    fn decide(
        &self,
        command: &TodoListCommand,
        state: &TodoCounterState,
    ) -> Result<Vec<TodoListEvent>, DomainError> {
        match command {
            TodoListCommand::AddTodo { .. } if state.todos >= MAX_TODOS => Err(DomainError::rule(
                format!("can't have more than {MAX_TODOS} todos"),
            )),
            _ => Ok(Vec::new()),
        }
    }

    fn evolve(&self, state: TodoCounterState, event: &TodoListEvent) -> TodoCounterState {
        match event {
            TodoListEvent::TodoAdded { .. } => TodoCounterState {
                todos: state.todos.saturating_add(1),
            },
            TodoListEvent::TodoRemoved { .. } => TodoCounterState {
                todos: state.todos.saturating_sub(1),
            },
            TodoListEvent::TodoToggled { .. } => state,
        }
    }

    fn initial_state(&self) -> TodoCounterState {
        TodoCounterState::default()
    }

    fn is_terminal(&self, _state: &TodoCounterState) -> bool {
        false
    }
}
