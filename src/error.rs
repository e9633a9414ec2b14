use thiserror::Error;

use crate::types::ColumnLabel;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source '{source_name}' failed: {message}")]
    SourceFetch { source_name: String, message: String },

    #[error("No data available: every configured source failed")]
    NoDataAvailable,

    #[error("Cannot merge an empty list of fragments")]
    EmptyInput,

    #[error("Duplicate column labels after canonicalization: {}", join_labels(.duplicates))]
    RenameIntegrity { duplicates: Vec<ColumnLabel> },

    #[error("Failed to write output '{path}': {message}")]
    OutputWrite { path: String, message: String },
}

fn join_labels(labels: &[ColumnLabel]) -> String {
    labels
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, StatsError>;
