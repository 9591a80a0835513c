use std::cmp::Reverse;

use super::{StoreResult, TaskStore};
use crate::date_range::DayRange;
use crate::task::{LogEntry, Task, TaskId};

/// Vec-backed store, for embedding and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryTaskStore {
    tasks: Vec<Task>,
    logs: Vec<LogEntry>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_task(&mut self, task: Task) {
        self.tasks.retain(|t| t.id != task.id);
        self.tasks.push(task);
    }

    pub fn insert_log(&mut self, entry: LogEntry) {
        self.logs.retain(|l| l.id != entry.id);
        self.logs.push(entry);
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.insert_task(task);
        self
    }

    pub fn with_log(mut self, entry: LogEntry) -> Self {
        self.insert_log(entry);
        self
    }
}

impl TaskStore for MemoryTaskStore {
    fn find_completed_tasks(&self, status: &str, range: &DayRange) -> StoreResult<Vec<Task>> {
        Ok(self
            .tasks
            .iter()
            .filter(|t| t.status == status)
            .filter(|t| t.completed_at.is_some_and(|at| range.contains(at)))
            .cloned()
            .collect())
    }

    fn find_task_logs(&self, task_id: TaskId) -> StoreResult<Vec<LogEntry>> {
        let mut logs: Vec<LogEntry> = self
            .logs
            .iter()
            .filter(|l| l.task_id == task_id)
            .cloned()
            .collect();
        logs.sort_by_key(|l| Reverse((l.created_at, l.id)));
        Ok(logs)
    }
}
