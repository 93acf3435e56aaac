//! UI Components for the Data Sweeper application.
//!
//! # Layout Components
//! - [`Header`] - App name, file count and session status
//! - [`Hero`] - Main title and description
//! - [`Footer`] - Page footer
//!
//! # Feature Components
//! - [`UploadSection`] - Multi-file upload
//! - [`FileCard`] - One uploaded file with its commands
//! - [`DataTable`] - Preview of the first rows
//! - [`BarChartView`] - Bar chart of a numeric column
//! - [`LogsPanel`] - Real-time processing logs (SSE)

mod header;
mod hero;
mod upload;
mod file_card;
mod chart;
mod footer;
mod logs;

pub use header::*;
pub use hero::*;
pub use upload::*;
pub use file_card::*;
pub use chart::*;
pub use footer::*;
pub use logs::*;
