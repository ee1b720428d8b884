//! Todo list held in a single aggregate.

use decider_core::{Decider, DomainError};
use serde::{Deserialize, Serialize};

/// Commands accepted by the todo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoListCommand {
    /// Add a todo.
    AddTodo {
        /// Todo identifier.
        id: String,
        /// Label of the todo.
        name: String,
    },
    /// Mark a todo as done.
    ToggleTodo {
        /// Todo identifier.
        id: String,
    },
    /// Delete a todo.
    RemoveTodo {
        /// Todo identifier.
        id: String,
    },
}

/// Events emitted by the todo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoListEvent {
    /// A todo was added.
    TodoAdded {
        /// Todo identifier.
        id: String,
        /// Label of the todo.
        name: String,
    },
    /// A todo was marked as done.
    TodoToggled {
        /// Todo identifier.
        id: String,
    },
    /// A todo was deleted.
    TodoRemoved {
        /// Todo identifier.
        id: String,
    },
}

/// One entry of the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Todo identifier.
    pub id: String,
    /// Label of the todo.
    pub name: String,
    /// Whether the todo is done.
    pub done: bool,
}

/// Folded todo list state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TodoListState {
    /// Todos in insertion order.
    pub todos: Vec<TodoItem>,
}

impl TodoListState {
    fn contains(&self, id: &str) -> bool {
        self.todos.iter().any(|todo| todo.id == id)
    }
}

/// Decider for the todo list.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodoList;

fn ensure_exists(state: &TodoListState, id: &str) -> Result<(), DomainError> {
    if state.contains(id) {
        Ok(())
    } else {
        Err(DomainError::rule("unknown todo"))
    }
}

impl Decider for TodoList {
    type Command = TodoListCommand;
    type State = TodoListState;
    type Event = TodoListEvent;

    fn decide(
        &self,
        command: &TodoListCommand,
        state: &TodoListState,
    ) -> Result<Vec<TodoListEvent>, DomainError> {
        match command {
            TodoListCommand::AddTodo { id, name } => {
                if state.contains(id) {
                    return Err(DomainError::rule("todo already exists"));
                }
                Ok(vec![TodoListEvent::TodoAdded {
                    id: id.clone(),
                    name: name.clone(),
                }])
            }
            TodoListCommand::ToggleTodo { id } => {
                ensure_exists(state, id)?;
                Ok(vec![TodoListEvent::TodoToggled { id: id.clone() }])
            }
            TodoListCommand::RemoveTodo { id } => {
                ensure_exists(state, id)?;
                Ok(vec![TodoListEvent::TodoRemoved { id: id.clone() }])
            }
        }
    }

    fn evolve(&self, mut state: TodoListState, event: &TodoListEvent) -> TodoListState {
        match event {
            TodoListEvent::TodoAdded { id, name } => state.todos.push(TodoItem {
                id: id.clone(),
                name: name.clone(),
                done: false,
            }),
            TodoListEvent::TodoToggled { id } => {
                for todo in state.todos.iter_mut().filter(|todo| &todo.id == id) {
                    todo.done = true;
                }
            }
            TodoListEvent::TodoRemoved { id } => state.todos.retain(|todo| &todo.id != id),
        }
        state
    }

    fn initial_state(&self) -> TodoListState {
        TodoListState::default()
    }

    fn is_terminal(&self, _state: &TodoListState) -> bool {
        false
    }
}
