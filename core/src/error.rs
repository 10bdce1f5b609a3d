//! Error types for the core library

use thiserror::Error;

/// Task store mutation, used to label failures and notices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Update,
    Delete,
    Toggle,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Toggle => "toggle",
        }
    }

    /// Notice shown to the user when the operation fails
    pub fn failure_notice(&self) -> &'static str {
        match self {
            Self::Add => "Failed to add task",
            Self::Update => "Failed to update task",
            Self::Delete => "Failed to delete task",
            Self::Toggle => "Failed to update task",
        }
    }

    /// Notice shown to the user when the operation succeeds
    pub fn success_notice(&self) -> &'static str {
        match self {
            Self::Add => "Task added successfully!",
            Self::Update | Self::Toggle => "Task updated successfully!",
            Self::Delete => "Task deleted successfully!",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Structured backend is not available")]
    CapabilityAbsent,

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Failed to {operation} task: {message}")]
    Mutation {
        operation: Operation,
        message: String,
    },

    #[error("Fallback store error: {0}")]
    Fallback(String),

    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store not ready: {0}")]
    NotReady(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Short human-readable message, safe to show to end users.
    ///
    /// Raw backend text never leaks through here; it only goes to the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Mutation { operation, .. } => operation.failure_notice().to_string(),
            Self::TaskNotFound(id) => format!("Task {} not found", id),
            Self::InvalidInput(msg) => msg.clone(),
            Self::NotReady(_) => "Tasks are not loaded yet".to_string(),
            Self::CapabilityAbsent | Self::Initialization(_) | Self::Fallback(_) => {
                "Failed to load tasks".to_string()
            }
            Self::Bridge(_) | Self::Io(_) | Self::Serialization(_) => {
                "Something went wrong".to_string()
            }
        }
    }
}
