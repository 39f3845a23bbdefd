use async_trait::async_trait;

use crate::error::QualityResult;
use crate::types::{Score, ScoreInput};

/// Capability contract every backend in the chain implements.
#[async_trait]
pub trait Scorer: Send + Sync {
    fn name(&self) -> &str;

    async fn score(&self, input: &ScoreInput) -> QualityResult<Score>;

    async fn score_batch(&self, inputs: &[ScoreInput]) -> Vec<QualityResult<Score>> {
        let mut out = Vec::with_capacity(inputs.len());
        for input in inputs {
            out.push(self.score(input).await);
        }
        out
    }

    fn available(&self) -> bool;

    /// Relative cost of one call, in whatever unit the deployment cares
    /// about (model-seconds, dollars, tokens). The heuristic backend is
    /// always zero.
    fn cost(&self) -> f64;

    async fn close(&self) {}
}
