//! Error types for Minefleet
//!
//! This module defines the error taxonomy shared by the simulator and the
//! analytics components. Every failure is dataset-level: no component skips
//! an individual row and carries on.

use thiserror::Error;

/// Result type alias for Minefleet operations
pub type Result<T> = std::result::Result<T, FleetError>;

/// Main error type for Minefleet operations
#[derive(Error, Debug)]
pub enum FleetError {
    /// Invalid machine manifest or simulation configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Required columns absent from a table
    #[error("Schema error: missing columns [{}]", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Aggregation requested over zero rows
    #[error("Empty dataset: {operation} needs at least one row")]
    EmptyDataset { operation: &'static str },

    /// Stratified split impossible because a class is too small
    #[error("Insufficient data: class fail_risk={class} has {count} example(s), need at least 2")]
    InsufficientData { class: bool, count: usize },

    /// Malformed cell in a table
    #[error("Parse error at line {line}, column '{column}': {message}")]
    Parse {
        line: u64,
        column: String,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FleetError {
    /// Shorthand for a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        FleetError::Configuration(message.into())
    }
}
