use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("vector not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("unsupported manifest version: found {found}, supported up to {supported}")]
    ManifestVersion { found: u16, supported: u16 },
}

pub type VectorResult<T> = Result<T, VectorError>;
