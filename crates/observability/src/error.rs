use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encode failed: {0}")]
    Snapshot(String),
}

pub type ObservabilityResult<T> = Result<T, ObservabilityError>;
