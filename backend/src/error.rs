//! Error types for the Data Sweeper conversion pipeline.
//!
//! - [`IngestError`] - Reading CSV / spreadsheet bytes into a table
//! - [`TableError`] - Table shape invariants (unique names, equal lengths)
//! - [`ChartError`] - Bar chart column selection
//! - [`PipelineError`] - File-scoped errors surfaced to the user
//! - [`ServerError`] - HTTP layer errors
//!
//! Every pipeline error is scoped to a single file: callers processing a batch
//! report it and move on to the next file.

use thiserror::Error;

// =============================================================================
// Ingest Errors
// =============================================================================

/// Errors while parsing uploaded bytes.
#[derive(Debug, Error)]
pub enum IngestError {
    /// No header row at all.
    #[error("file is empty")]
    Empty,

    /// A data row does not fit the header.
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// CSV tokenizer error.
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook could not be opened or read.
    #[error("invalid spreadsheet: {0}")]
    Spreadsheet(String),

    /// Text could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Parsed content violates a table invariant.
    #[error(transparent)]
    Table(#[from] TableError),
}

// =============================================================================
// Table Errors
// =============================================================================

/// Violations of the [`crate::models::Table`] invariants.
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("column '{column}' has {found} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },
}

// =============================================================================
// Chart Errors
// =============================================================================

/// Reasons a bar chart cannot be drawn. These are displayed as a notice.
#[derive(Debug, Error, PartialEq)]
pub enum ChartError {
    /// Default selection needs a third numeric column.
    #[error("need at least {needed} numeric columns to chart, found {found}")]
    NotEnoughNumericColumns { needed: usize, found: usize },

    #[error("column not found: {0}")]
    UnknownColumn(String),

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),
}

// =============================================================================
// Pipeline Errors (top-level, file scoped)
// =============================================================================

/// File-scoped pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Extension is neither `.csv` nor `.xlsx`.
    #[error("Unsupported file type for '{file}' ({extension}). Please upload a CSV or Excel file.")]
    UnsupportedFormat { file: String, extension: String },

    /// Bytes could not be parsed.
    #[error("Failed to read '{file}': {source}")]
    Ingest {
        file: String,
        #[source]
        source: IngestError,
    },

    /// Projection names columns the table does not have.
    #[error("Unknown column(s): {}", .0.join(", "))]
    UnknownColumn(Vec<String>),

    /// Projection names the same column twice.
    #[error("Column selected more than once: {0}")]
    DuplicateSelection(String),

    /// Serializer failed.
    #[error("Export of '{file}' failed: {message}")]
    ExportFailed { file: String, message: String },

    /// No file with this id in the session.
    #[error("File not found: {0}")]
    UnknownFile(String),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Table(#[from] TableError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// No session with this id.
    #[error("Session not found: {0}")]
    UnknownSession(String),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingest operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
