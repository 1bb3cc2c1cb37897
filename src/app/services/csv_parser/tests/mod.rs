//! Test utilities for sweep CSV parser testing
//!
//! Shared fixtures and helpers used across the parser test modules.

use std::io::Write;
use tempfile::NamedTempFile;

mod parser_tests;
mod stats_tests;

/// Identifier used by most fixtures
pub const VALID_ID: &str = "ABC12345_20250522_084534_left";

/// Three-row fixture: one good row, one bad identifier, one duplicate key
pub fn create_scenario_csv() -> String {
    format!(
        "filename,1000\n{id},-75.5\nnot-an-identifier,-60.0\n{id},-70.0\n",
        id = VALID_ID
    )
}

/// Fixture with mixed header spellings and a few bad cells
pub fn create_mixed_header_csv() -> String {
    "name,freq_100,F125,160 Hz,0200,notes\n\
     SN00001_20240101_120000_right,-10.5,-11,abc,-13.25,x\n\
     SN00002_20240102_130000_rec1,NA,,-12.0,,y\n\
     SN00003_20240103_140000_rec2,NaN,null,N/A,,z\n"
        .to_string()
}

/// Helper to create a temporary file with given content
pub fn create_temp_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{}", content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Helper to create a temporary file with raw bytes
pub fn create_temp_bytes(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}
