use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::archive::{ArchiveBuilder, DEFAULT_EXTENSION, EntryOutcome};
use crate::date_range::{DayRange, resolve_day};
use crate::error::ExportResult;
use crate::persistence::TaskStore;
use crate::render::{DocumentRenderer, TemplateRenderer};
use crate::task::STATUS_DONE;
use crate::view::{TaskView, group_logs};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Done tasks whose completion fell inside the day.
    pub matched: usize,
    /// Documents written into the archive, counting replaced ones.
    pub rendered: usize,
    /// Tasks dropped because their template failed to render.
    pub skipped: usize,
    /// Entries overwritten by a later task with the same file name.
    pub replaced: usize,
}

impl ExportSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = vec![
            format!("matched={}", self.matched),
            format!("rendered={}", self.rendered),
        ];
        if self.skipped > 0 {
            parts.push(format!("skipped={}", self.skipped));
        }
        if self.replaced > 0 {
            parts.push(format!("replaced={}", self.replaced));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone)]
pub struct DailyExport {
    pub day: NaiveDate,
    pub archive: Vec<u8>,
    pub summary: ExportSummary,
}

/// Runs the daily pipeline over a store and an already loaded renderer.
pub struct DailyExporter<S, R> {
    store: S,
    renderer: R,
    extension: String,
}

impl<S: TaskStore, R: DocumentRenderer> DailyExporter<S, R> {
    pub fn new(store: S, renderer: R) -> Self {
        Self {
            store,
            renderer,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Exports the day named by `date` (`YYYY-MM-DD`, or today when absent or empty).
    pub fn export(&self, date: Option<&str>) -> ExportResult<DailyExport> {
        let range = resolve_day(date)?;
        self.export_range(&range)
    }

    /// Archive bytes only.
    pub fn export_archive(&self, date: Option<&str>) -> ExportResult<Vec<u8>> {
        Ok(self.export(date)?.archive)
    }

    pub fn export_range(&self, range: &DayRange) -> ExportResult<DailyExport> {
        log::info!(
            "exporting tasks completed on {} ({} ..= {})",
            range.day,
            range.start,
            range.end
        );
        let tasks = self.store.find_completed_tasks(STATUS_DONE, range)?;

        let mut summary = ExportSummary {
            matched: tasks.len(),
            ..ExportSummary::default()
        };
        let mut archive = ArchiveBuilder::new(self.extension.as_str());

        for task in &tasks {
            // A failed log fetch aborts the whole export.
            let logs = self.store.find_task_logs(task.id)?;
            let view = TaskView::build(task, group_logs(&logs));

            let document = match self.renderer.render(&view) {
                Ok(document) => document,
                Err(err) => {
                    log::warn!("skipping task {} '{}': {}", task.id, task.title, err);
                    summary.skipped += 1;
                    continue;
                }
            };

            log::debug!(
                "rendered task {} with {} log entries into {}",
                task.id,
                logs.len(),
                archive.file_name(&task.title)
            );
            summary.rendered += 1;
            if archive.add(&task.title, document) == EntryOutcome::Replaced {
                log::debug!("replaced earlier entry {}", archive.file_name(&task.title));
                summary.replaced += 1;
            }
        }

        let archive = archive.finish()?;
        log::info!("export for {} done: {}", range.day, summary.to_cli_summary());
        Ok(DailyExport {
            day: range.day,
            archive,
            summary,
        })
    }
}

/// Resolves the date, loads the template from `template_path`, then exports.
///
/// The template is loaded once before any task is read, so a missing or
/// malformed template aborts without touching the store.
pub fn export_daily<S: TaskStore, P: AsRef<Path>>(
    store: S,
    template_path: P,
    date: Option<&str>,
    extension: &str,
) -> ExportResult<DailyExport> {
    let range = resolve_day(date)?;
    let renderer = TemplateRenderer::from_path(template_path)?;
    DailyExporter::new(store, renderer)
        .with_extension(extension)
        .export_range(&range)
}
