use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum QualityError {
    #[error("content unsupported by this scorer: {0}")]
    UnsupportedContent(String),

    #[error("scorer unavailable")]
    Unavailable,

    #[error("scorer backend failed: {0}")]
    Backend(String),

    #[error("circuit open, rejecting call")]
    CircuitOpen,

    #[error("all scorers failed, last error: {0}")]
    AllScorersFailed(Box<QualityError>),
}

pub type QualityResult<T> = Result<T, QualityError>;
