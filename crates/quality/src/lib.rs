//! Fallback-chain quality scoring: neural and heuristic backends composed
//! behind a single ordered chain with per-backend statistics.

pub mod chain;
pub mod circuit_breaker;
pub mod error;
pub mod heuristic;
pub mod neural;
pub mod retry;
pub mod scorer;
pub mod types;

pub use chain::{BackendStats, ScorerChain};
pub use error::{QualityError, QualityResult};
pub use heuristic::HeuristicScorer;
pub use neural::{Interpretation, NeuralConfig, NeuralScorer};
pub use scorer::Scorer;
pub use types::{Score, ScoreInput, Signals};
