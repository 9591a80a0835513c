pub mod archive;
pub mod config;
pub mod date_range;
pub mod error;
pub mod export;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod persistence;
pub mod render;
pub mod task;
pub mod view;

pub use archive::{ArchiveBuilder, EntryOutcome, sanitize_title};
pub use config::{ConfigError, ExportConfig};
pub use date_range::{DayRange, resolve_day, resolve_day_on};
pub use error::{ExportError, ExportResult};
pub use export::{DailyExport, DailyExporter, ExportSummary, export_daily};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteTaskStore;
pub use persistence::{MemoryTaskStore, StoreError, StoreResult, TaskStore};
pub use render::{DocumentRenderer, RenderError, TemplateError, TemplateRenderer};
pub use task::{LogEntry, STATUS_DONE, Task, TaskId};
pub use view::{LogGroups, LogView, TaskView, group_logs};
