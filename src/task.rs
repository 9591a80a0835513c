use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub type TaskId = i64;

/// Status value carried by tasks that count as completed.
pub const STATUS_DONE: &str = "done";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub category: String,
    pub status: String,
    pub description: String,
    pub targets: String,
    pub created_at: DateTime<Local>,
    pub completed_at: Option<DateTime<Local>>,
    pub deadline: Option<DateTime<Local>>,
}

impl Task {
    pub fn new(id: TaskId, title: impl Into<String>, created_at: DateTime<Local>) -> Self {
        Self {
            id,
            title: title.into(),
            category: String::new(),
            status: String::new(),
            description: String::new(),
            targets: String::new(),
            created_at,
            completed_at: None,
            deadline: None,
        }
    }

    /// Marks the task done at `at`.
    pub fn completed(mut self, at: DateTime<Local>) -> Self {
        self.status = STATUS_DONE.to_string();
        self.completed_at = Some(at);
        self
    }
}

/// A progress note attached to a single task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub task_id: TaskId,
    pub created_at: DateTime<Local>,
    pub log_text: String,
    pub progress_note: String,
}

impl LogEntry {
    pub fn new(
        id: i64,
        task_id: TaskId,
        created_at: DateTime<Local>,
        log_text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            task_id,
            created_at,
            log_text: log_text.into(),
            progress_note: String::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.progress_note = note.into();
        self
    }
}
