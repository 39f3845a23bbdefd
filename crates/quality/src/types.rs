use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// A normalized quality score plus the metadata the chain decorates onto
/// whichever backend produced it (`fallback_used`, `fallback_attempts`).
/// `method` names the backend that produced the value directly, so callers
/// don't need to read it back out of `metadata`.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub value: f64,
    pub confidence: f64,
    pub method: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

impl Score {
    pub fn new(value: f64, confidence: f64) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            method: String::new(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }
}

/// Implicit/behavioral signals the heuristic backend combines. Everything
/// defaults to the "no signal observed" value so a freshly created element
/// still produces a (low-confidence) score.
#[derive(Debug, Clone, Default)]
pub struct Signals {
    pub access_count: u64,
    pub reference_count: u64,
    pub age_days: f64,
    pub days_since_last_access: f64,
    pub user_rating: Option<f64>,
    pub content_length: usize,
    pub tag_count: usize,
    pub promoted: bool,
}

/// Content handed to a scorer. `text` is what gets tokenized by the neural
/// backend; `signals` is what the heuristic backend reads. A scorer only
/// reads the half of this it understands.
#[derive(Debug, Clone, Default)]
pub struct ScoreInput {
    pub text: String,
    pub signals: Signals,
}
