//! REST API types for frontend integration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::chart::BarChart;
use crate::error::{PipelineError, ServerError};
use crate::models::OutputFormat;
use crate::session::{FileSummary, UploadOutcome};
use crate::transform::CleanReport;

/// Response to `POST /api/sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
}

/// Response to a multipart upload: one outcome per file, in upload order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub session_id: String,
    /// "ready" when every file loaded, "warning" when some failed
    pub status: String,
    pub files: Vec<UploadOutcome>,
}

impl UploadResponse {
    pub fn new(session_id: String, files: Vec<UploadOutcome>) -> Self {
        let status = if files.iter().all(|f| f.status == "ok") {
            "ready"
        } else {
            "warning"
        };
        Self {
            session_id,
            status: status.to_string(),
            files,
        }
    }
}

/// Response to a cleaning command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResponse {
    pub report: CleanReport,
    pub file: FileSummary,
}

/// Body of `PUT .../columns`. A missing or `null` list selects every column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsRequest {
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

/// Body of `POST .../convert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub format: OutputFormat,
}

/// Query of `GET .../chart`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartQuery {
    pub column: Option<String>,
}

/// Response of `GET .../chart`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
    pub chart: BarChart,
}

/// Create an error response body.
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(e) => match e {
                PipelineError::UnsupportedFormat { .. } | PipelineError::Ingest { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                PipelineError::UnknownColumn(_) | PipelineError::DuplicateSelection(_) => {
                    StatusCode::BAD_REQUEST
                }
                PipelineError::UnknownFile(_) => StatusCode::NOT_FOUND,
                PipelineError::Chart(_) => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::ExportFailed { .. } | PipelineError::Table(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ServerError::UnknownSession(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}
