use thiserror::Error;

/// Errors surfaced by the element store.
///
/// Variants map 1:1 onto the error kinds spec'd for the store component;
/// `CatalogError` in the root crate folds these in alongside every other
/// component's error type.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("element already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record at {path}: {reason}")]
    CorruptRecord { path: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
