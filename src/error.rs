use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PriceHistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed timestamp on line {line}: '{value}' ({reason})")]
    MalformedTimestamp {
        line: u64,
        value: String,
        reason: String,
    },

    #[error("Source unavailable: {}", .0.display())]
    SourceUnavailable(PathBuf),

    #[error("Malformed row on line {line}: {message}")]
    MalformedRow { line: u64, message: String },

    #[error("Ambiguous date window: {0}")]
    AmbiguousWindow(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, PriceHistoryError>;
