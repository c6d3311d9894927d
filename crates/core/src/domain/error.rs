// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A posting did not yield a required field; the posting is omitted for the tick
    #[error("Posting skipped: missing {field}")]
    ExtractionSkip { field: &'static str },

    #[error("Invalid job id: {0:?}")]
    InvalidJobId(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
