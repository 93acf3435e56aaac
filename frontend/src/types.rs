//! Common types used across the frontend application.
//!
//! # Categories
//!
//! - **Log Types** - Real-time log streaming
//! - **File Types** - Uploaded file summaries and previews
//! - **Command Types** - Cleaning reports, charts, export formats
//! - **Error Types** - Frontend error handling

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// =============================================================================
// Log Types
// =============================================================================

/// Log severity level.
///
/// Matches the backend's log levels for SSE streaming.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    /// Get CSS class for styling.
    pub fn css_class(&self) -> &'static str {
        match self {
            LogLevel::Info => "log-info",
            LogLevel::Success => "log-success",
            LogLevel::Warning => "log-warning",
            LogLevel::Error => "log-error",
        }
    }
}

/// A single log entry, from the backend stream or from the UI itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting level for sub-steps
    #[serde(default)]
    pub indent: u8,
    /// Display time (HH:MM:SS)
    #[serde(default)]
    pub timestamp: String,
}

// =============================================================================
// File Types
// =============================================================================

/// Response from `POST /api/sessions`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
}

/// One column's name, type and missing-value count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// "numeric" or "text"
    pub kind: String,
    pub missing: usize,
}

impl ColumnInfo {
    pub fn is_numeric(&self) -> bool {
        self.kind == "numeric"
    }
}

/// First rows of the (projected) table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    /// Cells are numbers, strings or null
    pub rows: Vec<Vec<Value>>,
}

/// Metadata and preview of one uploaded file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub id: String,
    pub name: String,
    pub size: usize,
    pub size_label: String,
    pub format: String,
    pub encoding: Option<String>,
    pub delimiter: Option<String>,
    pub sheet: Option<String>,
    pub row_count: usize,
    pub columns: Vec<ColumnInfo>,
    /// Columns currently kept, in order
    pub selection: Vec<String>,
    /// RFC 3339 upload time
    #[serde(default)]
    pub uploaded_at: Option<String>,
    pub preview: TablePreview,
}

impl FileSummary {
    /// Numeric columns among the current selection.
    pub fn numeric_selection(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric() && self.selection.contains(&c.name))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn missing_total(&self) -> usize {
        self.columns.iter().map(|c| c.missing).sum()
    }

    /// Upload time in local `HH:MM:SS`.
    pub fn uploaded_label(&self) -> Option<String> {
        let uploaded = chrono::DateTime::parse_from_rfc3339(self.uploaded_at.as_deref()?).ok()?;
        Some(uploaded.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
    }
}

/// Upload result for one file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub file: String,
    /// "ok" or "error"
    pub status: String,
    pub summary: Option<FileSummary>,
    pub error: Option<String>,
}

/// Response from the backend upload endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub session_id: String,
    /// "ready" or "warning"
    pub status: String,
    pub files: Vec<UploadOutcome>,
}

// =============================================================================
// Command Types
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImputedColumn {
    pub column: String,
    pub mean: f64,
    pub cells_filled: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputeReport {
    pub filled: Vec<ImputedColumn>,
    pub skipped: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    pub duplicates_removed: Option<usize>,
    pub imputation: Option<ImputeReport>,
}

impl CleanReport {
    /// One-line description for the UI.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(n) = self.duplicates_removed {
            parts.push(format!("Duplicates removed: {}", n));
        }
        if let Some(ref imputation) = self.imputation {
            let filled: usize = imputation.filled.iter().map(|c| c.cells_filled).sum();
            parts.push(format!("Missing values filled: {}", filled));
            if !imputation.skipped.is_empty() {
                parts.push(format!("left empty: {}", imputation.skipped.join(", ")));
            }
        }
        parts.join(" • ")
    }
}

/// Response of the cleaning commands.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CleanResponse {
    pub report: CleanReport,
    pub file: FileSummary,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub label: String,
    pub value: Option<f64>,
}

/// Bar chart data for one numeric column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub column: String,
    pub bars: Vec<Bar>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl BarChart {
    /// Bar height as a percentage of the largest magnitude.
    pub fn height_percent(&self, value: f64) -> f64 {
        let scale = self
            .max
            .unwrap_or(0.0)
            .abs()
            .max(self.min.unwrap_or(0.0).abs());
        if scale == 0.0 {
            0.0
        } else {
            (value.abs() / scale * 100.0).clamp(0.0, 100.0)
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartResponse {
    pub chart: BarChart,
}

/// Conversion target offered in the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "xlsx")]
    Excel,
}

impl OutputFormat {
    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "CSV",
            OutputFormat::Excel => "Excel",
        }
    }
}

/// Downloaded conversion result.
#[derive(Clone, Debug)]
pub struct Download {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Render a preview cell: numbers without a trailing `.0`, null as empty.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Frontend application errors.
#[derive(Clone, Debug)]
pub enum AppError {
    /// Upload failed.
    Upload(String),
    /// Network/HTTP error.
    Network(String),
    /// The backend rejected the request.
    Server { status: u16, message: String },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Upload(msg) => write!(f, "Upload error: {}", msg),
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::Server { status, message } => write!(f, "Server error ({}): {}", status, message),
        }
    }
}

impl std::error::Error for AppError {}

/// Result type alias for frontend operations.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_deserialization() {
        let json = r#"{
            "sessionId": "9b2f",
            "status": "warning",
            "files": [
                {
                    "file": "sales.csv",
                    "status": "ok",
                    "summary": {
                        "id": "f1",
                        "name": "sales.csv",
                        "size": 1536,
                        "sizeLabel": "1.50 KB",
                        "format": "csv",
                        "encoding": "utf-8",
                        "delimiter": ",",
                        "sheet": null,
                        "rowCount": 2,
                        "columns": [
                            {"name": "region", "kind": "text", "missing": 0},
                            {"name": "total", "kind": "numeric", "missing": 1}
                        ],
                        "selection": ["region", "total"],
                        "uploadedAt": "2026-03-15T09:30:00Z",
                        "preview": {
                            "columns": ["region", "total"],
                            "rows": [["north", 12.0], ["south", null]]
                        }
                    },
                    "error": null
                },
                {
                    "file": "notes.txt",
                    "status": "error",
                    "summary": null,
                    "error": "Unsupported file type .txt"
                }
            ]
        }"#;

        let response: UploadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, "warning");
        assert_eq!(response.files.len(), 2);

        let summary = response.files[0].summary.as_ref().unwrap();
        assert_eq!(summary.size_label, "1.50 KB");
        assert_eq!(summary.numeric_selection(), vec!["total".to_string()]);
        assert_eq!(summary.missing_total(), 1);
        assert!(summary.uploaded_label().is_some());
        assert_eq!(cell_text(&summary.preview.rows[0][1]), "12");
        assert_eq!(cell_text(&summary.preview.rows[1][1]), "");
        assert!(response.files[1].error.is_some());
    }

    #[test]
    fn test_cell_text_keeps_long_integers() {
        let row: Vec<Value> = serde_json::from_str("[1234567890123456789, 2.0, 2.5]").unwrap();
        assert_eq!(cell_text(&row[0]), "1234567890123456789");
        assert_eq!(cell_text(&row[1]), "2");
        assert_eq!(cell_text(&row[2]), "2.5");
    }

    #[test]
    fn test_clean_report_describe() {
        let json = r#"{
            "duplicatesRemoved": 3,
            "imputation": {
                "filled": [{"column": "val", "mean": 2.0, "cellsFilled": 4}],
                "skipped": ["empty"]
            }
        }"#;
        let report: CleanReport = serde_json::from_str(json).unwrap();
        assert_eq!(
            report.describe(),
            "Duplicates removed: 3 • Missing values filled: 4 • left empty: empty"
        );
    }

    #[test]
    fn test_log_entry_from_stream() {
        let json = r#"{"level":"warning","message":"careful","indent":1,"timestamp":"2024-01-01T10:00:00Z"}"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.level, LogLevel::Warning);
        assert_eq!(entry.level.css_class(), "log-warning");
        assert_eq!(entry.indent, 1);
    }

    #[test]
    fn test_chart_heights() {
        let chart = BarChart {
            column: "c".into(),
            bars: vec![],
            min: Some(-2.0),
            max: Some(4.0),
        };
        assert_eq!(chart.height_percent(4.0), 100.0);
        assert_eq!(chart.height_percent(-2.0), 50.0);
    }

    #[test]
    fn test_output_format_serialization() {
        assert_eq!(serde_json::to_string(&OutputFormat::Excel).unwrap(), "\"xlsx\"");
        assert_eq!(OutputFormat::Csv.label(), "CSV");
    }
}
