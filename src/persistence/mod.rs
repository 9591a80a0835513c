use std::sync::Arc;

use thiserror::Error;

use crate::date_range::DayRange;
use crate::task::{LogEntry, Task, TaskId};

#[derive(Error, Debug)]
pub enum StoreError {
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to tasks and their progress logs.
pub trait TaskStore {
    /// Tasks with the given status whose completion timestamp lies inside
    /// `range`, both ends inclusive. Order is unspecified.
    fn find_completed_tasks(&self, status: &str, range: &DayRange) -> StoreResult<Vec<Task>>;

    /// Log entries for one task, newest first.
    fn find_task_logs(&self, task_id: TaskId) -> StoreResult<Vec<LogEntry>>;
}

impl<T: TaskStore + ?Sized> TaskStore for &T {
    fn find_completed_tasks(&self, status: &str, range: &DayRange) -> StoreResult<Vec<Task>> {
        (**self).find_completed_tasks(status, range)
    }

    fn find_task_logs(&self, task_id: TaskId) -> StoreResult<Vec<LogEntry>> {
        (**self).find_task_logs(task_id)
    }
}

impl<T: TaskStore + ?Sized> TaskStore for Box<T> {
    fn find_completed_tasks(&self, status: &str, range: &DayRange) -> StoreResult<Vec<Task>> {
        (**self).find_completed_tasks(status, range)
    }

    fn find_task_logs(&self, task_id: TaskId) -> StoreResult<Vec<LogEntry>> {
        (**self).find_task_logs(task_id)
    }
}

impl<T: TaskStore + ?Sized> TaskStore for Arc<T> {
    fn find_completed_tasks(&self, status: &str, range: &DayRange) -> StoreResult<Vec<Task>> {
        (**self).find_completed_tasks(status, range)
    }

    fn find_task_logs(&self, task_id: TaskId) -> StoreResult<Vec<LogEntry>> {
        (**self).find_task_logs(task_id)
    }
}

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryTaskStore;
