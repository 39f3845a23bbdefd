use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexicalError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("document already indexed: {0}")]
    AlreadyExists(String),

    #[error("term dictionary build failed: {0}")]
    Dictionary(String),
}

pub type LexicalResult<T> = Result<T, LexicalError>;
