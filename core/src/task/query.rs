//! Filtering, search and summary statistics over a task list

use chrono::NaiveDate;
use serde::Serialize;
use std::str::FromStr;

use super::model::{Task, TaskPriority};
use crate::{Error, Result};

/// Filter bar selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
    Priority(TaskPriority),
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
            Self::Priority(priority) => task.priority == *priority,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => other
                .parse::<TaskPriority>()
                .map(Self::Priority)
                .map_err(|_| Error::InvalidInput(format!("Unknown filter: {}", other))),
        }
    }
}

/// Case-insensitive match over title, description and category
pub fn matches_search(task: &Task, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    let contains = |text: &str| text.to_lowercase().contains(&term);
    contains(&task.title)
        || task.description.as_deref().is_some_and(contains)
        || task.category.as_deref().is_some_and(contains)
}

/// Apply search then filter, keeping the input order
pub fn filter_tasks<'a>(tasks: &'a [Task], filter: TaskFilter, search: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| matches_search(task, search))
        .filter(|task| filter.matches(task))
        .collect()
}

/// Summary counts shown above the list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub high_priority_active: usize,
    pub overdue: usize,
    /// Rounded percentage of completed tasks
    pub completion_rate: u8,
}

impl TaskStats {
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        let high_priority_active = tasks
            .iter()
            .filter(|t| !t.completed && t.priority == TaskPriority::High)
            .count();
        let overdue = tasks.iter().filter(|t| t.is_overdue(today)).count();
        let completion_rate = if total > 0 {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        } else {
            0
        };

        Self {
            total,
            completed,
            active: total - completed,
            high_priority_active,
            overdue,
            completion_rate,
        }
    }
}
