use serde::Serialize;
use thiserror::Error;

use catalog_lexical::LexicalError;
use catalog_observability::ObservabilityError;
use catalog_quality::QualityError;
use catalog_retention::SweepError;
use catalog_store::StoreError;
use catalog_vector::VectorError;

/// Aggregate error type for the whole catalog core. Every
/// sub-crate error folds in here via `#[from]`; `kind()` maps each variant
/// onto the exact error-kind string the tool surface reports.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lexical(#[from] LexicalError),

    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error(transparent)]
    Quality(#[from] QualityError),

    #[error(transparent)]
    Sweep(#[from] SweepError),

    #[error(transparent)]
    Observability(#[from] ObservabilityError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation canceled")]
    Canceled,

    #[error("operation timed out")]
    Timeout,
}

impl CatalogError {
    /// The stable error-kind string surfaced to tool callers.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::Store(StoreError::NotFound(_)) => "not-found",
            CatalogError::Store(StoreError::AlreadyExists(_)) => "already-exists",
            CatalogError::Store(StoreError::InvalidArgument(_)) => "invalid-argument",
            CatalogError::Store(StoreError::Io(_)) => "io-error",
            CatalogError::Store(StoreError::CorruptRecord { .. }) => "corrupt-record",

            CatalogError::Lexical(LexicalError::NotFound(_)) => "not-found",
            CatalogError::Lexical(LexicalError::AlreadyExists(_)) => "already-exists",
            CatalogError::Lexical(LexicalError::Dictionary(_)) => "invalid-argument",

            CatalogError::Vector(VectorError::NotFound(_)) => "not-found",
            CatalogError::Vector(VectorError::DimensionMismatch { .. }) => "dimension-mismatch",
            CatalogError::Vector(VectorError::Io(_)) => "io-error",
            CatalogError::Vector(VectorError::Serialization(_)) => "corrupt-record",
            CatalogError::Vector(VectorError::ManifestVersion { .. }) => "corrupt-record",

            CatalogError::Quality(QualityError::UnsupportedContent(_)) => "unsupported-content",
            CatalogError::Quality(QualityError::Unavailable) => "unavailable",
            CatalogError::Quality(QualityError::Backend(_)) => "unavailable",
            CatalogError::Quality(QualityError::CircuitOpen) => "unavailable",
            CatalogError::Quality(QualityError::AllScorersFailed(_)) => "all-scorers-failed",

            CatalogError::Sweep(SweepError::Source(_)) => "io-error",

            CatalogError::Observability(ObservabilityError::Io(_)) => "io-error",
            CatalogError::Observability(ObservabilityError::Snapshot(_)) => "io-error",

            CatalogError::InvalidArgument(_) => "invalid-argument",
            CatalogError::Canceled => "canceled",
            CatalogError::Timeout => "timeout",
        }
    }

    /// A suggestion to surface alongside validation failures.
    fn suggestion(&self) -> Option<String> {
        match self {
            CatalogError::InvalidArgument(_) => {
                Some("check the request shape against the tool's input schema".to_string())
            }
            CatalogError::Vector(VectorError::DimensionMismatch { expected, .. }) => {
                Some(format!("supply an embedding of dimension {expected}"))
            }
            _ => None,
        }
    }

    pub fn into_failure_result(self) -> FailureResult {
        let kind = self.kind().to_string();
        let suggestion = self.suggestion();
        FailureResult {
            kind,
            message: self.to_string(),
            suggestion,
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Structured failure shape every tool result carries in place of a typed
/// output: `{kind, message, suggestion?}`.
#[derive(Debug, Clone, Serialize)]
pub struct FailureResult {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_not_found_kind() {
        let err = CatalogError::Store(StoreError::NotFound("e1".into()));
        assert_eq!(err.kind(), "not-found");
    }

    #[test]
    fn all_scorers_failed_maps_through() {
        let err = CatalogError::Quality(QualityError::AllScorersFailed(Box::new(
            QualityError::Unavailable,
        )));
        assert_eq!(err.kind(), "all-scorers-failed");
    }

    #[test]
    fn dimension_mismatch_carries_suggestion() {
        let err = CatalogError::Vector(VectorError::DimensionMismatch {
            expected: 384,
            got: 128,
        });
        let failure = err.into_failure_result();
        assert_eq!(failure.kind, "dimension-mismatch");
        assert!(failure.suggestion.is_some());
    }
}
