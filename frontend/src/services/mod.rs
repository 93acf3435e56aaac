//! Backend communication and browser helpers.
//!
//! # Services
//!
//! - [`api`] - Session, upload and command calls to the backend
//! - [`download`] - Saving converted files in the browser

pub mod api;
pub mod download;

pub use api::*;
pub use download::*;
