//! Template-ready projections of tasks and their logs.
//!
//! Views hold only preformatted strings and simple groupings so templates
//! never have to deal with time zones or optional timestamps.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::date_range::DATE_FORMAT;
use crate::task::{LogEntry, Task};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogView {
    pub time: String,
    pub text: String,
    pub note: String,
}

impl From<&LogEntry> for LogView {
    fn from(entry: &LogEntry) -> Self {
        Self {
            time: entry.created_at.format(TIME_OF_DAY_FORMAT).to_string(),
            text: entry.log_text.clone(),
            note: entry.progress_note.clone(),
        }
    }
}

/// Log views keyed by local calendar day, plus the day keys newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogGroups {
    pub by_date: BTreeMap<String, Vec<LogView>>,
    pub reverse_sorted_dates: Vec<String>,
}

/// Groups `logs` by creation day. Order inside each day follows the input,
/// so newest-first input stays newest-first per day.
pub fn group_logs(logs: &[LogEntry]) -> LogGroups {
    let mut by_date: BTreeMap<String, Vec<LogView>> = BTreeMap::new();
    for entry in logs {
        let day = entry.created_at.format(DATE_FORMAT).to_string();
        by_date.entry(day).or_default().push(LogView::from(entry));
    }
    // Fixed-width YYYY-MM-DD keys sort chronologically.
    let reverse_sorted_dates = by_date.keys().rev().cloned().collect();
    LogGroups {
        by_date,
        reverse_sorted_dates,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub title: String,
    pub category: String,
    pub status: String,
    pub description: String,
    pub targets: String,
    pub created_at: String,
    pub completed_at: String,
    pub deadline: String,
    pub logs_by_date: BTreeMap<String, Vec<LogView>>,
    pub reverse_sorted_dates: Vec<String>,
}

impl TaskView {
    pub fn build(task: &Task, groups: LogGroups) -> Self {
        Self {
            title: task.title.clone(),
            category: task.category.clone(),
            status: task.status.clone(),
            description: task.description.clone(),
            targets: task.targets.clone(),
            created_at: format_timestamp(task.created_at),
            completed_at: task.completed_at.map(format_timestamp).unwrap_or_default(),
            deadline: task.deadline.map(format_timestamp).unwrap_or_default(),
            logs_by_date: groups.by_date,
            reverse_sorted_dates: groups.reverse_sorted_dates,
        }
    }
}

fn format_timestamp(instant: DateTime<Local>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}
