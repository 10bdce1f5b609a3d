//! Task module
//!
//! This module contains the task model, seed data and list queries.

mod model;
mod query;
mod seed;

pub use model::*;
pub use query::{filter_tasks, matches_search, TaskFilter, TaskStats};
pub use seed::seed_tasks;
