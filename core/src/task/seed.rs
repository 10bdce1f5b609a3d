//! Example tasks inserted on first run

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::model::{NewTask, TaskPriority};

struct SeedTask {
    title: &'static str,
    description: &'static str,
    completed: bool,
    priority: TaskPriority,
    category: &'static str,
    due_date: Option<(i32, u32, u32)>,
    created_at: (u32, u32, u32),
    updated_at: (u32, u32, u32),
}

// January 2024 timestamps as (day, hour, minute). Newest first.
const SEED_TASKS: [SeedTask; 6] = [
    SeedTask {
        title: "Complete project documentation",
        description: "Write comprehensive documentation for the new feature release",
        completed: false,
        priority: TaskPriority::High,
        category: "Work",
        due_date: Some((2024, 1, 20)),
        created_at: (15, 9, 0),
        updated_at: (15, 9, 0),
    },
    SeedTask {
        title: "Review pull requests",
        description: "Review and provide feedback on pending PRs",
        completed: true,
        priority: TaskPriority::Medium,
        category: "Development",
        due_date: Some((2024, 1, 16)),
        created_at: (14, 14, 30),
        updated_at: (15, 10, 15),
    },
    SeedTask {
        title: "Update dependencies",
        description: "Update all packages to latest stable versions",
        completed: false,
        priority: TaskPriority::Low,
        category: "Maintenance",
        due_date: None,
        created_at: (13, 11, 0),
        updated_at: (13, 11, 0),
    },
    SeedTask {
        title: "Team meeting preparation",
        description: "Prepare agenda and slides for weekly team sync",
        completed: false,
        priority: TaskPriority::Medium,
        category: "Meetings",
        due_date: Some((2024, 1, 18)),
        created_at: (12, 16, 0),
        updated_at: (12, 16, 0),
    },
    SeedTask {
        title: "Code refactoring",
        description: "Refactor authentication module for better performance",
        completed: true,
        priority: TaskPriority::High,
        category: "Development",
        due_date: None,
        created_at: (10, 8, 30),
        updated_at: (11, 15, 45),
    },
    SeedTask {
        title: "Database backup",
        description: "Schedule and verify weekly database backup",
        completed: false,
        priority: TaskPriority::High,
        category: "Maintenance",
        due_date: Some((2024, 1, 19)),
        created_at: (9, 13, 0),
        updated_at: (9, 13, 0),
    },
];

fn january_2024((day, hour, minute): (u32, u32, u32)) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

/// The seed set, ordered by `created_at` descending.
pub fn seed_tasks() -> Vec<NewTask> {
    SEED_TASKS
        .iter()
        .map(|seed| NewTask {
            title: seed.title.to_string(),
            description: Some(seed.description.to_string()),
            completed: seed.completed,
            priority: seed.priority,
            category: Some(seed.category.to_string()),
            due_date: seed
                .due_date
                .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            created_at: january_2024(seed.created_at),
            updated_at: january_2024(seed.updated_at),
        })
        .collect()
}
