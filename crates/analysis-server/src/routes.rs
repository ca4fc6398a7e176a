//! HTTP surface: a single upload-analyze-download endpoint plus the
//! service banner and health check.
//!
//! Uploads land in a per-request temp directory that is deleted on every
//! exit path, and the rendered workbook travels back base64-encoded in
//! the JSON response instead of behind a download URL. The inputs
//! contain personally identifiable call data, so nothing may persist
//! server-side after the response is sent.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::info;

use analysis_core::analyze::{analyze, AnalysisReport};
use analysis_core::reference::ReferenceTable;

use crate::error::ApiError;

/// The exports are full call logs; allow well above the default 2 MiB
/// body limit.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub reference: Arc<ReferenceTable>,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/analyze", post(analyze_files))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Call analysis API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "analyze": "/analyze",
            "health": "/health",
        },
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Response payload for `/analyze`.
#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    summary: AnalysisSummary,
    statistics: Vec<CategoryStatistics>,
    /// The rendered report workbook, base64-encoded.
    excel_file_base64: String,
}

#[derive(Debug, Serialize)]
struct AnalysisSummary {
    total_calls: usize,
    unique_exams: usize,
    categories_found: usize,
    bugs_detected: usize,
}

#[derive(Debug, Serialize)]
struct CategoryStatistics {
    category: String,
    total: usize,
    exam_not_found: usize,
    exam_not_authorized: usize,
    all_exams: String,
}

impl AnalyzeResponse {
    fn from_report(report: &AnalysisReport) -> Self {
        let statistics = report
            .summaries
            .iter()
            .map(|summary| CategoryStatistics {
                category: summary.category.label().to_string(),
                total: summary.total,
                exam_not_found: summary.not_found,
                exam_not_authorized: summary.not_authorized,
                all_exams: summary.all_exams.clone(),
            })
            .collect();

        Self {
            summary: AnalysisSummary {
                total_calls: report.total_calls(),
                unique_exams: report.unique_exams(),
                categories_found: report.categories_found(),
                bugs_detected: report.bugs_detected(),
            },
            statistics,
            excel_file_base64: base64::engine::general_purpose::STANDARD
                .encode(&report.workbook),
        }
    }
}

/// Accept the two export uploads, run the analysis pass, and return the
/// statistics plus the rendered workbook.
async fn analyze_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut not_found: Option<Vec<u8>> = None;
    let mut not_authorized: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(format!("malformed multipart body: {err}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "not_found" | "not_authorized" => {
                let bytes = field.bytes().await.map_err(|err| {
                    ApiError::BadRequest(format!("failed to read field '{name}': {err}"))
                })?;
                if name == "not_found" {
                    not_found = Some(bytes.to_vec());
                } else {
                    not_authorized = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }

    let not_found = not_found
        .ok_or_else(|| ApiError::BadRequest("missing file field 'not_found'".to_string()))?;
    let not_authorized = not_authorized
        .ok_or_else(|| ApiError::BadRequest("missing file field 'not_authorized'".to_string()))?;

    // Per-request work area, uniquely named, removed when dropped on
    // every exit path (success, handled errors, panics).
    let workdir = tempfile::tempdir()
        .map_err(|err| ApiError::Internal(format!("failed to create work area: {err}")))?;
    let not_found_path = workdir.path().join("not_found.xlsx");
    let not_authorized_path = workdir.path().join("not_authorized.xlsx");
    tokio::fs::write(&not_found_path, &not_found)
        .await
        .map_err(|err| ApiError::Internal(format!("failed to store upload: {err}")))?;
    tokio::fs::write(&not_authorized_path, &not_authorized)
        .await
        .map_err(|err| ApiError::Internal(format!("failed to store upload: {err}")))?;

    // The core transform is synchronous; run it off the async executor.
    let reference = Arc::clone(&state.reference);
    let report =
        tokio::task::spawn_blocking(move || analyze(&not_found_path, &not_authorized_path, &reference))
            .await
            .map_err(|err| ApiError::Internal(format!("analysis task failed: {err}")))??;

    info!(
        total_calls = report.total_calls(),
        unique_exams = report.unique_exams(),
        categories = report.categories_found(),
        bugs_detected = report.bugs_detected(),
        "analysis request served"
    );

    Ok(Json(AnalyzeResponse::from_report(&report)))
}
