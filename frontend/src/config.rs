//! Application configuration.
//!
//! Compile-time constants for the Data Sweeper frontend.

/// Backend API base URL.
pub const BACKEND_URL: &str = "http://localhost:3000";

/// Application name shown in the header.
pub const APP_NAME: &str = "Data Sweeper";

/// File types offered by the file picker.
pub const ACCEPTED_EXTENSIONS: &str = ".csv,.xlsx";

/// Rows shown in each file preview (the backend sends this many).
pub const PREVIEW_ROWS: usize = 5;

/// Maximum logs to keep in memory.
pub const MAX_LOG_ENTRIES: usize = 100;
