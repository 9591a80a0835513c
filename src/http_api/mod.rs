use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{DailyExporter, DocumentRenderer, ExportError, TaskStore};

pub type SharedStore = Arc<dyn TaskStore + Send + Sync>;
pub type SharedRenderer = Arc<dyn DocumentRenderer + Send + Sync>;

const MATCHED_HEADER: HeaderName = HeaderName::from_static("x-export-matched");
const RENDERED_HEADER: HeaderName = HeaderName::from_static("x-export-rendered");
const SKIPPED_HEADER: HeaderName = HeaderName::from_static("x-export-skipped");

#[derive(Clone)]
pub struct AppState {
    exporter: Arc<DailyExporter<SharedStore, SharedRenderer>>,
}

impl AppState {
    pub fn new(store: SharedStore, renderer: SharedRenderer) -> Self {
        Self::with_exporter(DailyExporter::new(store, renderer))
    }

    pub fn with_exporter(exporter: DailyExporter<SharedStore, SharedRenderer>) -> Self {
        Self {
            exporter: Arc::new(exporter),
        }
    }

    fn exporter(&self) -> Arc<DailyExporter<SharedStore, SharedRenderer>> {
        self.exporter.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Invalid(String),
    Internal(String),
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    date: Option<String>,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<ExportError> for ApiError {
    fn from(value: ExportError) -> Self {
        if value.is_client_error() {
            ApiError::Invalid(value.to_string())
        } else {
            ApiError::Internal(value.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Invalid(message) => {
                let body = Json(ErrorBody {
                    error: "invalid_request",
                    message,
                });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Internal(message) => {
                log::error!("export request failed: {message}");
                let body = Json(ErrorBody {
                    error: "internal_error",
                    message,
                });
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/export/daily", get(daily_export))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn daily_export(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let exporter = state.exporter();
    let export = tokio::task::spawn_blocking(move || exporter.export(query.date.as_deref()))
        .await
        .map_err(|err| ApiError::internal(format!("export worker failed: {err}")))??;

    let disposition = format!("attachment; filename=\"chronicle-{}.zip\"", export.day);
    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
        (MATCHED_HEADER, export.summary.matched.to_string()),
        (RENDERED_HEADER, export.summary.rendered.to_string()),
        (SKIPPED_HEADER, export.summary.skipped.to_string()),
    ];
    Ok((StatusCode::OK, headers, export.archive).into_response())
}
