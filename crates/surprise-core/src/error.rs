//! Error types for the surprise pipeline.
//!
//! Every library crate in the workspace returns [`Result`], so a stage can
//! decide per error whether to skip an entry or abort.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum SurpriseError {
    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required input file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Error when a required column is missing from the data.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when data is insufficient for the requested operation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// No date column could be identified in a main table.
    #[error("Could not identify the date column in {0}")]
    MissingDateColumn(String),

    /// A table about to be joined repeats a join key.
    #[error("Table {table} has {count} duplicate date keys")]
    DuplicateKeys {
        /// Table (asset) name.
        table: String,
        /// Number of repeated keys.
        count: usize,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed file pattern.
    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    /// A path matched by a pattern could not be read.
    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    /// Failure reported by the boosting library.
    #[error("Model error: {0}")]
    Model(String),
}

/// A specialized Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, SurpriseError>;
