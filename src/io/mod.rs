//! I/O utilities for recorded event files.

pub mod ndjson;

// Re-export commonly used types and functions
pub use ndjson::{parse_ndjson_file, parse_ndjson_lines, NdjsonError};
