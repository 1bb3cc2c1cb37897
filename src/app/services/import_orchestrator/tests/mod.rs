//! Test utilities for import orchestration

use std::io::Write;
use tempfile::NamedTempFile;

use crate::app::services::import_orchestrator::{ImportOrchestrator, ImportRequest};
use crate::app::services::store::Store;


/// Fresh orchestrator over an initialized in-memory store
pub async fn create_orchestrator() -> ImportOrchestrator {
    let store = Store::in_memory().await.unwrap();
    store.initialize().await.unwrap();
    ImportOrchestrator::new(store)
}

/// Write content to a temporary `.csv` file
pub fn create_csv_file(content: &str) -> NamedTempFile {
    let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(temp_file, "{}", content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

pub fn request_for(file: &NamedTempFile, name: &str) -> ImportRequest {
    ImportRequest::new(file.path()).with_source_filename(name)
}
