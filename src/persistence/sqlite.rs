use super::{StoreError, StoreResult, TaskStore};
use crate::date_range::DayRange;
use crate::task::{LogEntry, Task, TaskId};
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use rusqlite::{Connection, Row, params};

/// Task store over a SQLite database. Timestamps are stored as nanoseconds
/// since the Unix epoch.
pub struct SqliteTaskStore {
    connection: Mutex<Connection>,
}

impl SqliteTaskStore {
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> StoreResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> StoreResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> StoreResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                targets TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                actual_completed_at INTEGER,
                deadline INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_status_completed
                ON tasks (status, actual_completed_at);
            CREATE TABLE IF NOT EXISTS task_logs (
                id INTEGER PRIMARY KEY,
                task_id INTEGER NOT NULL REFERENCES tasks (id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                log_text TEXT NOT NULL,
                progress_note TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_task_logs_task_created
                ON task_logs (task_id, created_at);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    /// Inserts or replaces a task row.
    pub fn insert_task(&self, task: &Task) -> StoreResult<()> {
        let conn = self.connection.lock();
        conn.execute(
            "INSERT OR REPLACE INTO tasks
                (id, title, category, status, description, targets, created_at, actual_completed_at, deadline)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                task.id,
                task.title,
                task.category,
                task.status,
                task.description,
                task.targets,
                to_nanos(task.created_at)?,
                task.completed_at.map(to_nanos).transpose()?,
                task.deadline.map(to_nanos).transpose()?,
            ],
        )?;
        Ok(())
    }

    /// Inserts or replaces a log row. The owning task must already exist.
    pub fn insert_log(&self, entry: &LogEntry) -> StoreResult<()> {
        let conn = self.connection.lock();
        conn.execute(
            "INSERT OR REPLACE INTO task_logs (id, task_id, created_at, log_text, progress_note)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                entry.task_id,
                to_nanos(entry.created_at)?,
                entry.log_text,
                entry.progress_note,
            ],
        )?;
        Ok(())
    }
}

impl TaskStore for SqliteTaskStore {
    fn find_completed_tasks(&self, status: &str, range: &DayRange) -> StoreResult<Vec<Task>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT id, title, category, status, description, targets, created_at, actual_completed_at, deadline
             FROM tasks
             WHERE status = ?1 AND actual_completed_at >= ?2 AND actual_completed_at <= ?3",
        )?;
        let rows = stmt.query_map(
            params![status, clamp_nanos(range.start), clamp_nanos(range.end)],
            task_from_row,
        )?;

        let mut tasks = Vec::new();
        for task in rows {
            tasks.push(task?);
        }
        Ok(tasks)
    }

    fn find_task_logs(&self, task_id: TaskId) -> StoreResult<Vec<LogEntry>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT id, task_id, created_at, log_text, progress_note
             FROM task_logs
             WHERE task_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![task_id], |row| {
            Ok(LogEntry {
                id: row.get(0)?,
                task_id: row.get(1)?,
                created_at: from_nanos(row.get(2)?),
                log_text: row.get(3)?,
                progress_note: row.get(4)?,
            })
        })?;

        let mut logs = Vec::new();
        for entry in rows {
            logs.push(entry?);
        }
        Ok(logs)
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        status: row.get(3)?,
        description: row.get(4)?,
        targets: row.get(5)?,
        created_at: from_nanos(row.get(6)?),
        completed_at: row.get::<_, Option<i64>>(7)?.map(from_nanos),
        deadline: row.get::<_, Option<i64>>(8)?.map(from_nanos),
    })
}

/// Query bounds saturate instead of failing: no stored row lies beyond i64 nanoseconds.
fn clamp_nanos(instant: DateTime<Local>) -> i64 {
    instant
        .timestamp_nanos_opt()
        .unwrap_or(if instant.timestamp() < 0 { i64::MIN } else { i64::MAX })
}

fn to_nanos(instant: DateTime<Local>) -> StoreResult<i64> {
    instant.timestamp_nanos_opt().ok_or_else(|| {
        StoreError::InvalidData(format!("timestamp {instant} is outside the storable range"))
    })
}

fn from_nanos(nanos: i64) -> DateTime<Local> {
    DateTime::from_timestamp_nanos(nanos).with_timezone(&Local)
}
