//! A single todo item, meant to be hosted in a `KeyedMap`.

use decider_core::{Decider, DomainError};
use serde::{Deserialize, Serialize};

/// Commands accepted by a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoCommand {
    /// Create the todo.
    AddTodo {
        /// Label of the todo.
        name: String,
    },
    /// Mark the todo as done.
    ToggleTodo,
    /// Delete the todo.
    RemoveTodo,
}

/// Events emitted by a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoEvent {
    /// The todo was created.
    TodoAdded {
        /// Label of the todo.
        name: String,
    },
    /// The todo was marked as done.
    TodoToggled,
    /// The todo was deleted.
    TodoRemoved,
}

/// Folded todo state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TodoState {
    /// Label, empty until the todo is added.
    pub name: String,
    /// Whether the todo was added.
    pub added: bool,
    /// Whether the todo is done.
    pub done: bool,
    /// Whether the todo was deleted.
    pub removed: bool,
}

/// Decider for one todo. Terminal once removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Todo;

impl Decider for Todo {
    type Command = TodoCommand;
    type State = TodoState;
    type Event = TodoEvent;

    fn decide(&self, command: &TodoCommand, state: &TodoState) -> Result<Vec<TodoEvent>, DomainError> {
        match command {
            TodoCommand::AddTodo { name } => Ok(vec![TodoEvent::TodoAdded { name: name.clone() }]),
            TodoCommand::ToggleTodo | TodoCommand::RemoveTodo if !state.added || state.removed => {
                Err(DomainError::rule("unknown todo"))
            }
            TodoCommand::ToggleTodo => Ok(vec![TodoEvent::TodoToggled]),
            TodoCommand::RemoveTodo => Ok(vec![TodoEvent::TodoRemoved]),
        }
    }

    fn evolve(&self, state: TodoState, event: &TodoEvent) -> TodoState {
        match event {
            TodoEvent::TodoAdded { name } => TodoState {
                name: name.clone(),
                added: true,
                done: false,
                removed: false,
            },
            TodoEvent::TodoToggled => TodoState {
                done: true,
                ..state
            },
            TodoEvent::TodoRemoved => TodoState {
                removed: true,
                ..state
            },
        }
    }

    fn initial_state(&self) -> TodoState {
        TodoState::default()
    }

    fn is_terminal(&self, state: &TodoState) -> bool {
        state.removed
    }
}
