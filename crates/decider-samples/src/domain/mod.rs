//! Domain deciders.

pub mod counter;
pub mod todo;
pub mod todo_counter;
pub mod todo_list;
