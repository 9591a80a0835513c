use std::cell::Cell;
use std::io::{Cursor, Read};

use chrono::{DateTime, Local, TimeDelta, TimeZone};
use chronicle_export::{
    DailyExporter, DayRange, DocumentRenderer, ExportError, LogEntry, MemoryTaskStore,
    RenderError, StoreError, StoreResult, Task, TaskId, TaskStore, TaskView, TemplateRenderer,
    export_daily, group_logs,
};
use zip::ZipArchive;

const DEFAULT_TEMPLATE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates/obsidian_task.md.j2");

fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(y, m, d, h, mi, s).single().unwrap()
}

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    content
}

/// Two done tasks on 2024-06-01 (one with logs over two days, one without),
/// one done on 2024-06-02, plus noise that must never be exported.
fn seeded_store() -> MemoryTaskStore {
    let mut store = MemoryTaskStore::new();
    store.insert_task(
        Task::new(1, "Plan sprint", at(2024, 5, 30, 9, 0, 0)).completed(at(2024, 6, 1, 11, 0, 0)),
    );
    store.insert_task(
        Task::new(2, "Fix login/logout", at(2024, 5, 31, 9, 0, 0))
            .completed(at(2024, 6, 1, 23, 30, 0)),
    );
    store.insert_task(
        Task::new(3, "Next day work", at(2024, 6, 1, 9, 0, 0)).completed(at(2024, 6, 2, 0, 0, 1)),
    );
    let mut in_progress = Task::new(4, "Still going", at(2024, 6, 1, 9, 0, 0));
    in_progress.status = "doing".into();
    in_progress.completed_at = Some(at(2024, 6, 1, 12, 0, 0));
    store.insert_task(in_progress);

    store.insert_log(LogEntry::new(10, 1, at(2024, 5, 31, 17, 0, 0), "drafted goals"));
    store.insert_log(LogEntry::new(11, 1, at(2024, 6, 1, 9, 30, 0), "reviewed backlog"));
    store.insert_log(LogEntry::new(12, 1, at(2024, 6, 1, 10, 45, 0), "sprint planned").with_note("done"));
    store
}

/// Echoes the title and day keys; fails for one chosen title.
struct EchoRenderer {
    fail_on: Option<&'static str>,
}

impl DocumentRenderer for EchoRenderer {
    fn render(&self, view: &TaskView) -> Result<Vec<u8>, RenderError> {
        if self.fail_on == Some(view.title.as_str()) {
            return Err(RenderError::Other(format!("cannot render {}", view.title)));
        }
        Ok(format!("{}:{}", view.title, view.reverse_sorted_dates.join(",")).into_bytes())
    }
}

#[test]
fn exports_only_tasks_completed_on_the_requested_day() {
    let renderer = TemplateRenderer::from_path(DEFAULT_TEMPLATE).unwrap();
    let exporter = DailyExporter::new(seeded_store(), renderer);

    let export = exporter.export(Some("2024-06-01")).unwrap();

    assert_eq!(
        entry_names(&export.archive),
        vec!["Fix login-logout.md", "Plan sprint.md"]
    );
    assert_eq!(export.summary.matched, 2);
    assert_eq!(export.summary.rendered, 2);
    assert_eq!(export.summary.skipped, 0);

    let plan = String::from_utf8(read_entry(&export.archive, "Plan sprint.md")).unwrap();
    assert!(plan.find("### 2024-06-01").unwrap() < plan.find("### 2024-05-31").unwrap());
    assert!(plan.find("10:45 sprint planned").unwrap() < plan.find("09:30 reviewed backlog").unwrap());

    let fix = String::from_utf8(read_entry(&export.archive, "Fix login-logout.md")).unwrap();
    assert!(fix.contains("_No log entries._"));
}

#[test]
fn archived_content_matches_independent_render() {
    let store = seeded_store();
    let renderer = TemplateRenderer::from_path(DEFAULT_TEMPLATE).unwrap();
    let exporter = DailyExporter::new(&store, &renderer);
    let export = exporter.export(Some("2024-06-01")).unwrap();

    let range = DayRange::for_day(export.day);
    for task in store.find_completed_tasks("done", &range).unwrap() {
        let logs = store.find_task_logs(task.id).unwrap();
        let expected = renderer.render(&TaskView::build(&task, group_logs(&logs))).unwrap();
        let name = format!("{}.md", task.title.replace('/', "-"));
        assert_eq!(read_entry(&export.archive, &name), expected);
    }
}

#[test]
fn titles_with_separators_are_flattened() {
    let store = MemoryTaskStore::new().with_task(
        Task::new(1, "a/b\\c", at(2024, 6, 1, 8, 0, 0)).completed(at(2024, 6, 1, 9, 0, 0)),
    );
    let exporter = DailyExporter::new(store, EchoRenderer { fail_on: None });
    let export = exporter.export(Some("2024-06-01")).unwrap();

    assert_eq!(entry_names(&export.archive), vec!["a-b-c.md"]);
    assert_eq!(read_entry(&export.archive, "a-b-c.md"), b"a/b\\c:");
}

#[test]
fn render_failure_skips_only_that_task() {
    let store = MemoryTaskStore::new()
        .with_task(Task::new(1, "one", at(2024, 6, 1, 8, 0, 0)).completed(at(2024, 6, 1, 9, 0, 0)))
        .with_task(Task::new(2, "two", at(2024, 6, 1, 8, 0, 0)).completed(at(2024, 6, 1, 10, 0, 0)))
        .with_task(Task::new(3, "three", at(2024, 6, 1, 8, 0, 0)).completed(at(2024, 6, 1, 11, 0, 0)));
    let exporter = DailyExporter::new(store, EchoRenderer { fail_on: Some("two") });

    let export = exporter.export(Some("2024-06-01")).unwrap();

    assert_eq!(entry_names(&export.archive), vec!["one.md", "three.md"]);
    assert_eq!(export.summary.matched, 3);
    assert_eq!(export.summary.rendered, 2);
    assert_eq!(export.summary.skipped, 1);
}

#[test]
fn template_runtime_error_is_isolated_per_task() {
    let store = MemoryTaskStore::new()
        .with_task(Task::new(1, "ok", at(2024, 6, 1, 8, 0, 0)).completed(at(2024, 6, 1, 9, 0, 0)))
        .with_task({
            let mut task = Task::new(2, "bad", at(2024, 6, 1, 8, 0, 0)).completed(at(2024, 6, 1, 9, 0, 0));
            task.category = "broken".into();
            task
        });
    let renderer = TemplateRenderer::from_source(
        "{{ title }}{% if category == 'broken' %}{{ missing_value }}{% endif %}",
    )
    .unwrap();

    let bytes = DailyExporter::new(store, renderer)
        .export_archive(Some("2024-06-01"))
        .unwrap();
    assert_eq!(entry_names(&bytes), vec!["ok.md"]);
}

#[test]
fn duplicate_file_names_keep_the_last_task() {
    let store = MemoryTaskStore::new()
        .with_task(Task::new(1, "x/y", at(2024, 6, 1, 8, 0, 0)).completed(at(2024, 6, 1, 9, 0, 0)))
        .with_task(Task::new(2, "x\\y", at(2024, 6, 1, 8, 0, 0)).completed(at(2024, 6, 1, 10, 0, 0)));
    let exporter = DailyExporter::new(store, EchoRenderer { fail_on: None });

    let export = exporter.export(Some("2024-06-01")).unwrap();

    assert_eq!(entry_names(&export.archive), vec!["x-y.md"]);
    assert_eq!(read_entry(&export.archive, "x-y.md"), b"x\\y:");
    assert_eq!(export.summary.rendered, 2);
    assert_eq!(export.summary.replaced, 1);
}

#[test]
fn no_matching_tasks_yield_an_empty_archive() {
    let exporter = DailyExporter::new(seeded_store(), EchoRenderer { fail_on: None });
    let export = exporter.export(Some("1999-01-01")).unwrap();
    assert!(entry_names(&export.archive).is_empty());
    assert_eq!(export.summary.matched, 0);
}

#[test]
fn completion_at_end_of_day_is_included_one_nanosecond_later_is_not() {
    let range = DayRange::for_day(chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    let store = MemoryTaskStore::new()
        .with_task(Task::new(1, "edge", range.start).completed(range.end))
        .with_task(Task::new(2, "over", range.start).completed(range.end + TimeDelta::nanoseconds(1)))
        .with_task(Task::new(3, "first instant", range.start).completed(range.start));

    let export = DailyExporter::new(store, EchoRenderer { fail_on: None })
        .export_range(&range)
        .unwrap();
    assert_eq!(entry_names(&export.archive), vec!["edge.md", "first instant.md"]);
}

#[test]
fn invalid_date_is_reported_before_any_query() {
    let exporter = DailyExporter::new(seeded_store(), EchoRenderer { fail_on: None });
    let err = exporter.export(Some("2024/13/40")).unwrap_err();
    assert!(matches!(err, ExportError::InvalidDateFormat(_)));
    assert!(err.is_client_error());
}

struct FailingStore {
    inner: MemoryTaskStore,
    fail_tasks: bool,
    fail_logs_for: Option<TaskId>,
    calls: Cell<usize>,
}

impl FailingStore {
    fn new(inner: MemoryTaskStore) -> Self {
        Self {
            inner,
            fail_tasks: false,
            fail_logs_for: None,
            calls: Cell::new(0),
        }
    }
}

impl TaskStore for FailingStore {
    fn find_completed_tasks(&self, status: &str, range: &DayRange) -> StoreResult<Vec<Task>> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_tasks {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        self.inner.find_completed_tasks(status, range)
    }

    fn find_task_logs(&self, task_id: TaskId) -> StoreResult<Vec<LogEntry>> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_logs_for == Some(task_id) {
            return Err(StoreError::Unavailable(format!("logs for {task_id}")));
        }
        self.inner.find_task_logs(task_id)
    }
}

#[test]
fn task_query_failure_aborts_the_export() {
    let mut store = FailingStore::new(seeded_store());
    store.fail_tasks = true;
    let err = DailyExporter::new(store, EchoRenderer { fail_on: None })
        .export(Some("2024-06-01"))
        .unwrap_err();
    assert!(matches!(err, ExportError::StoreQuery(StoreError::Unavailable(_))));
}

#[test]
fn one_log_fetch_failure_aborts_the_whole_batch() {
    let mut store = FailingStore::new(seeded_store());
    store.fail_logs_for = Some(2);
    let err = DailyExporter::new(store, EchoRenderer { fail_on: None })
        .export_archive(Some("2024-06-01"))
        .unwrap_err();
    assert!(matches!(err, ExportError::StoreQuery(_)));
}

#[test]
fn template_load_failure_aborts_before_touching_the_store() {
    let store = FailingStore::new(seeded_store());
    let err = export_daily(&store, "no/such/template.j2", Some("2024-06-01"), "md").unwrap_err();
    assert!(matches!(err, ExportError::TemplateLoad(_)));
    assert_eq!(store.calls.get(), 0);
}

#[test]
fn export_daily_uses_configured_extension() {
    let export = export_daily(seeded_store(), DEFAULT_TEMPLATE, Some("2024-06-02"), "txt").unwrap();
    assert_eq!(entry_names(&export.archive), vec!["Next day work.txt"]);
}
