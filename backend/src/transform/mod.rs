//! Transformation module.
//!
//! - Clean: duplicate removal and mean imputation
//! - Project: column selection
//! - Pipeline: Ingest → Clean → Project → Export per file

pub mod clean;
pub mod project;
pub mod pipeline;

pub use clean::*;
pub use project::*;
pub use pipeline::*;
