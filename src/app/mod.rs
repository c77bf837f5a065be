pub mod tasks;

pub use tasks::{Task, TasksController};
