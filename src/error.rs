use std::io;

use thiserror::Error;

/// Failures at the crate boundary: configuration loading and output writing.
/// Table extraction itself never fails.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid {category} pattern: {source}")]
    Pattern {
        category: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("invalid option: {0}")]
    InvalidOption(String),
}
