//! NDJSON (Newline Delimited JSON) file processing utilities.
//!
//! Recorded raw events are stored one JSON object per line. Blank lines are
//! skipped; every other line must be a JSON object.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::models::RawEvent;

/// Error types for NDJSON reading and parsing.
#[derive(Error, Debug)]
pub enum NdjsonError {
    /// I/O error when reading files
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error at line {line}: {source}")]
    JsonParse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A line parsed but is not a JSON object
    #[error("Invalid event at line {line}: {reason}")]
    InvalidEvent { line: usize, reason: String },

    /// Empty or invalid data
    #[error("No valid data found: {context}")]
    NoData { context: String },

    /// Generic error with context
    #[error("Error in {context}: {message}")]
    Generic { context: String, message: String },
}

impl NdjsonError {
    /// Create a new generic error with context
    pub fn generic(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generic {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a no data error
    pub fn no_data(context: impl Into<String>) -> Self {
        Self::NoData {
            context: context.into(),
        }
    }

    /// 1-based line number the error refers to, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::JsonParse { line, .. } | Self::InvalidEvent { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Parse NDJSON text line by line.
///
/// Yields one result per non-blank line so callers can report a bad line and
/// keep going.
pub fn parse_ndjson_lines(content: &str) -> impl Iterator<Item = Result<Value, NdjsonError>> + '_ {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<Value>(line).map_err(|e| NdjsonError::JsonParse {
                line: index + 1,
                source: e,
            })
        })
}

/// Parse an NDJSON file of raw events.
///
/// Strict: the first unparsable or non-object line fails the whole file, and a
/// file without any event is an error.
pub fn parse_ndjson_file(path: impl AsRef<Path>) -> Result<Vec<RawEvent>, NdjsonError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        NdjsonError::generic(
            "opening file",
            format!("Failed to open '{}': {}", path.display(), e),
        )
    })?;
    let reader = BufReader::new(file);
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line).map_err(|e| NdjsonError::JsonParse {
            line: line_number,
            source: e,
        })?;

        let event = RawEvent::try_from(value).map_err(|e| NdjsonError::InvalidEvent {
            line: line_number,
            reason: e.to_string(),
        })?;

        events.push(event);
    }

    if events.is_empty() {
        return Err(NdjsonError::no_data(format!(
            "No events found in file '{}'",
            path.display()
        )));
    }

    Ok(events)
}
