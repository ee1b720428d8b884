//! Sample deciders.
//!
//! A bounded counter and a few todo aggregates, used to exercise the
//! handlers and stores end to end.

pub mod domain;

pub use domain::counter::{Counter, CounterCommand, CounterEvent, CounterState};
pub use domain::todo::{Todo, TodoCommand, TodoEvent, TodoState};
pub use domain::todo_counter::{TodoCounter, TodoCounterState};
pub use domain::todo_list::{TodoItem, TodoList, TodoListCommand, TodoListEvent, TodoListState};
