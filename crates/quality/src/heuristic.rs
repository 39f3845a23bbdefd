use async_trait::async_trait;

use crate::error::QualityResult;
use crate::scorer::Scorer;
use crate::types::{Score, ScoreInput, Signals};

const WEIGHT_ACCESS: f64 = 0.30;
const WEIGHT_REFERENCES: f64 = 0.25;
const WEIGHT_RECENCY: f64 = 0.20;
const WEIGHT_LAST_ACCESS: f64 = 0.15;
const WEIGHT_RATING: f64 = 0.10;
const WEIGHT_LENGTH: f64 = 0.05;
const WEIGHT_TAGS: f64 = 0.05;
const PROMOTION_BONUS: f64 = 0.05;

const ACCESS_SATURATION: f64 = 100.0;
const REFERENCE_SATURATION: f64 = 20.0;
const RECENCY_HALF_LIFE_DAYS: f64 = 365.0;
const LAST_ACCESS_HALF_LIFE_DAYS: f64 = 30.0;
const LENGTH_SATURATION: f64 = 2000.0;
const TAG_SATURATION: f64 = 10.0;

const MAX_CONFIDENCE: f64 = 0.8;
const SIGNAL_COUNT: f64 = 6.0;

fn decay(days: f64, half_life: f64) -> f64 {
    1.0 / (1.0 + (days.max(0.0) / half_life))
}

fn saturating_ratio(value: f64, saturation: f64) -> f64 {
    (value / saturation).clamp(0.0, 1.0)
}

/// Signal-driven fallback scorer. Always available and free, so the chain
/// always has a last resort that cannot itself fail.
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn new() -> Self {
        Self
    }

    fn compute(signals: &Signals) -> Score {
        let access = saturating_ratio(signals.access_count as f64, ACCESS_SATURATION);
        let references = saturating_ratio(signals.reference_count as f64, REFERENCE_SATURATION);
        let recency = decay(signals.age_days, RECENCY_HALF_LIFE_DAYS);
        let last_access = decay(signals.days_since_last_access, LAST_ACCESS_HALF_LIFE_DAYS);
        let rating = signals
            .user_rating
            .map(|r| (r / 5.0).clamp(0.0, 1.0))
            .unwrap_or(0.5);
        let length = saturating_ratio(signals.content_length as f64, LENGTH_SATURATION);
        let tags = saturating_ratio(signals.tag_count as f64, TAG_SATURATION);
        let promotion_bonus = if signals.promoted { PROMOTION_BONUS } else { 0.0 };

        let value = WEIGHT_ACCESS * access
            + WEIGHT_REFERENCES * references
            + WEIGHT_RECENCY * recency
            + WEIGHT_LAST_ACCESS * last_access
            + WEIGHT_RATING * rating
            + WEIGHT_LENGTH * length
            + WEIGHT_TAGS * tags
            + promotion_bonus;

        let present = [
            signals.access_count > 0,
            signals.reference_count > 0,
            signals.user_rating.is_some(),
            signals.promoted,
            signals.tag_count > 0,
            signals.content_length > 0,
        ]
        .iter()
        .filter(|present| **present)
        .count() as f64;
        let confidence = (present / SIGNAL_COUNT * MAX_CONFIDENCE).min(MAX_CONFIDENCE);

        Score::new(value, confidence)
    }
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scorer for HeuristicScorer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn score(&self, input: &ScoreInput) -> QualityResult<Score> {
        Ok(Self::compute(&input.signals))
    }

    fn available(&self) -> bool {
        true
    }

    fn cost(&self) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn well_signaled_element_scores_high() {
        let input = ScoreInput {
            text: String::new(),
            signals: Signals {
                access_count: 200,
                reference_count: 30,
                age_days: 1.0,
                days_since_last_access: 0.0,
                user_rating: Some(5.0),
                content_length: 3000,
                tag_count: 10,
                promoted: true,
            },
        };
        let score = HeuristicScorer::new().score(&input).await.unwrap();
        assert!(score.value > 0.9);
        assert!((score.confidence - 0.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn blank_element_scores_low_confidence() {
        let input = ScoreInput::default();
        let score = HeuristicScorer::new().score(&input).await.unwrap();
        assert!(score.confidence < 0.2);
    }

    #[tokio::test]
    async fn heuristic_scorer_is_always_available() {
        assert!(HeuristicScorer::new().available());
        assert_eq!(HeuristicScorer::new().cost(), 0.0);
    }
}
