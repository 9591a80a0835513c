use thiserror::Error;

use crate::persistence::StoreError;
use crate::render::TemplateError;

/// Fatal export failures. A per-task render failure is not one of these; the
/// exporter skips that task instead.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDateFormat(String),

    #[error("store query failed: {0}")]
    StoreQuery(#[from] StoreError),

    #[error("template load failed: {0}")]
    TemplateLoad(#[from] TemplateError),

    #[error("archive write failed: {0}")]
    ArchiveWrite(#[from] zip::result::ZipError),
}

impl ExportError {
    /// Whether the caller supplied bad input, as opposed to an internal failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ExportError::InvalidDateFormat(_))
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
