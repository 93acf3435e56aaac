//! HTTP API module.
//!
//! Axum server, request/response types and the SSE log broadcaster.

pub mod server;
pub mod types;
pub mod logs;

pub use server::{router, start_server, AppState};
pub use types::*;
pub use logs::*;
