use thiserror::Error;

/// Errors raised by the analytics pipeline.
///
/// Numeric counter failures never show up here: an unparseable counter is
/// carried as `None` and the affected delta pairs are skipped.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Index {index} out of range (available: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Insufficient history: series length {length} must exceed lookback {lookback}")]
    InsufficientHistory { length: usize, lookback: usize },

    #[error("Missing mapping: {0}")]
    MissingMapping(String),

    #[error("Invalid model artifact: {0}")]
    Artifact(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AnalyticsError {
    /// Short machine-readable kind, used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "ParseError",
            Self::Validation(_) => "ValidationError",
            Self::IndexOutOfRange { .. } => "IndexOutOfRange",
            Self::InsufficientHistory { .. } => "InsufficientHistory",
            Self::MissingMapping(_) => "MissingMapping",
            Self::Artifact(_) => "ArtifactError",
            Self::Model(_) => "ModelError",
            Self::Io(_) => "IoError",
            Self::Json(_) => "JsonError",
            Self::Csv(_) => "CsvError",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
