//! Import orchestration for sweep measurement files
//!
//! Drives one file through parsing, validation and persistence, and keeps the
//! import run audit record in step with it.
//!
//! ## Architecture
//!
//! - [`orchestrator`] - Run lifecycle and per-row persistence
//! - [`result`] - Request and result types returned to callers

pub mod orchestrator;
pub mod result;

#[cfg(test)]
pub mod tests;

pub use orchestrator::ImportOrchestrator;
pub use result::{ImportRequest, ImportResult, RowErrorReport};
