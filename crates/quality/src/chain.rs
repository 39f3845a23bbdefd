use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::{QualityError, QualityResult};
use crate::scorer::Scorer;
use crate::types::{Score, ScoreInput};

#[derive(Debug, Clone, Default)]
pub struct BackendStats {
    pub calls: u64,
    pub successes: u64,
    pub failures: u64,
    pub cumulative_cost: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Ordered fallback chain of scorer backends. `score` walks the
/// chain in configured order, skipping unavailable backends and recording
/// per-backend call/success/failure/cost stats as it goes; the first
/// success wins and gets stamped with `fallback_used`/`fallback_attempts`.
pub struct ScorerChain {
    backends: Vec<Box<dyn Scorer>>,
    stats: DashMap<String, Mutex<BackendStats>>,
}

impl ScorerChain {
    pub fn new(backends: Vec<Box<dyn Scorer>>) -> Self {
        let stats = DashMap::new();
        for backend in &backends {
            stats.insert(backend.name().to_string(), Mutex::new(BackendStats::default()));
        }
        Self { backends, stats }
    }

    fn record(&self, name: &str, success: bool, cost: f64) {
        if let Some(entry) = self.stats.get(name) {
            let mut stats = entry.lock().unwrap();
            stats.calls += 1;
            if success {
                stats.successes += 1;
                stats.cumulative_cost += cost;
            } else {
                stats.failures += 1;
            }
            stats.last_updated = Some(Utc::now());
        }
    }

    pub async fn score(&self, input: &ScoreInput) -> QualityResult<Score> {
        let mut attempts = 0u32;
        let mut last_error: Option<QualityError> = None;

        for backend in &self.backends {
            attempts += 1;
            if !backend.available() {
                self.record(backend.name(), false, 0.0);
                continue;
            }
            match backend.score(input).await {
                Ok(mut score) => {
                    self.record(backend.name(), true, backend.cost());
                    score.method = backend.name().to_string();
                    score
                        .metadata
                        .insert("fallback_used".to_string(), backend.name().to_string());
                    score
                        .metadata
                        .insert("fallback_attempts".to_string(), attempts.to_string());
                    return Ok(score);
                }
                Err(e) => {
                    self.record(backend.name(), false, 0.0);
                    last_error = Some(e);
                }
            }
        }

        Err(QualityError::AllScorersFailed(Box::new(
            last_error.unwrap_or(QualityError::Unavailable),
        )))
    }

    pub async fn score_batch(&self, inputs: &[ScoreInput]) -> Vec<QualityResult<Score>> {
        let mut out = Vec::with_capacity(inputs.len());
        for input in inputs {
            out.push(self.score(input).await);
        }
        out
    }

    pub fn stats(&self) -> HashMap<String, BackendStats> {
        self.stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().lock().unwrap().clone()))
            .collect()
    }

    pub fn reset_stats(&self) {
        for entry in self.stats.iter() {
            *entry.value().lock().unwrap() = BackendStats::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct AlwaysFails;
    #[async_trait]
    impl Scorer for AlwaysFails {
        fn name(&self) -> &str {
            "always-fails"
        }
        async fn score(&self, _input: &ScoreInput) -> QualityResult<Score> {
            Err(QualityError::Backend("boom".into()))
        }
        fn available(&self) -> bool {
            true
        }
        fn cost(&self) -> f64 {
            1.0
        }
    }

    struct Flaky {
        failed_once: AtomicBool,
    }
    #[async_trait]
    impl Scorer for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }
        async fn score(&self, _input: &ScoreInput) -> QualityResult<Score> {
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                Err(QualityError::UnsupportedContent("vocab overflow".into()))
            } else {
                Ok(Score::new(0.7, 0.9))
            }
        }
        fn available(&self) -> bool {
            true
        }
        fn cost(&self) -> f64 {
            0.5
        }
    }

    struct AlwaysSucceeds;
    #[async_trait]
    impl Scorer for AlwaysSucceeds {
        fn name(&self) -> &str {
            "heuristic"
        }
        async fn score(&self, _input: &ScoreInput) -> QualityResult<Score> {
            Ok(Score::new(0.5, 0.6))
        }
        fn available(&self) -> bool {
            true
        }
        fn cost(&self) -> f64 {
            0.0
        }
    }

    #[tokio::test]
    async fn falls_through_to_working_backend() {
        let chain = ScorerChain::new(vec![Box::new(AlwaysFails), Box::new(AlwaysSucceeds)]);
        let score = chain.score(&ScoreInput::default()).await.unwrap();
        assert_eq!(score.metadata.get("fallback_used").unwrap(), "heuristic");
        assert_eq!(score.metadata.get("fallback_attempts").unwrap(), "2");
    }

    #[tokio::test]
    async fn all_failing_backends_returns_terminal_error() {
        let chain = ScorerChain::new(vec![Box::new(AlwaysFails)]);
        let err = chain.score(&ScoreInput::default()).await.unwrap_err();
        assert!(matches!(err, QualityError::AllScorersFailed(_)));
    }

    #[tokio::test]
    async fn stats_tracks_calls_and_failures() {
        let chain = ScorerChain::new(vec![Box::new(AlwaysFails), Box::new(AlwaysSucceeds)]);
        chain.score(&ScoreInput::default()).await.unwrap();
        let stats = chain.stats();
        assert_eq!(stats["always-fails"].calls, 1);
        assert_eq!(stats["always-fails"].failures, 1);
        assert_eq!(stats["heuristic"].successes, 1);
    }

    #[tokio::test]
    async fn neural_failure_falls_back_to_heuristic() {
        let chain = ScorerChain::new(vec![
            Box::new(Flaky {
                failed_once: AtomicBool::new(false),
            }),
            Box::new(AlwaysSucceeds),
        ]);
        let score = chain.score(&ScoreInput::default()).await.unwrap();
        assert_eq!(score.metadata.get("fallback_used").unwrap(), "heuristic");
    }
}
