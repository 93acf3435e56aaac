//! # Data Sweeper - CSV and Excel conversion and cleaning
//!
//! Data Sweeper reads uploaded CSV or `.xlsx` files into an in-memory table,
//! optionally removes duplicate rows and fills missing numbers, keeps a chosen
//! set of columns, and writes the result back out as CSV or Excel.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Upload     │────▶│   Ingest    │────▶│   Clean     │────▶│   Project   │
//! │ (.csv/xlsx) │     │ (auto-enc)  │     │ (dedup/fill)│     │  (columns)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    ▼
//!                                                             ┌─────────────┐
//!                                                             │   Export    │
//!                                                             │ (csv/xlsx)  │
//!                                                             └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use datasweep::{convert_file, ConvertOptions, OutputFormat, UploadedFile};
//!
//! let file = UploadedFile::new("data.csv", std::fs::read("data.csv")?);
//! let result = convert_file(&file, &ConvertOptions::new(OutputFormat::Spreadsheet))?;
//! assert_eq!(result.artifact.file_name, "data.xlsx");
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Table, cells, uploads and export artifacts
//! - [`parser`] - CSV / spreadsheet ingest
//! - [`transform`] - Cleaning, projection and the pipeline
//! - [`export`] - CSV / spreadsheet writers
//! - [`chart`] - Bar chart data
//! - [`session`] - Per-user file state and commands
//! - [`config`] - Server configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Pipeline stages
pub mod parser;
pub mod transform;
pub mod export;
pub mod chart;

// Per-user state
pub mod session;

// Configuration
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ChartError, IngestError, PipelineError, ServerError, TableError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Cell, Column, ColumnType, ConversionRequest, ExportArtifact, FileFormat, OutputFormat, Table,
    UploadedFile,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use parser::{detect_format, ingest, read_upload, Ingested, ParseInfo};

pub use transform::{
    clean, convert_batch, convert_file, deduplicate, impute_missing, project, CleanOptions,
    CleanReport, ConvertOptions, ConvertResult, FileOutcome, ImputeReport,
};

pub use export::export;

pub use chart::{bar_chart, BarChart};

pub use session::{Command, CommandOutput, FileSummary, Session, SessionStore};

pub use config::Config;

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
