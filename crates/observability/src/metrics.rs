use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ObservabilityError, ObservabilityResult};

const MAX_SAMPLES: usize = 10_000;
const SLOW_FAST_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub operation: String,
    pub duration_ms: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationBreakdown {
    pub count: usize,
    pub average_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dashboard {
    pub count: usize,
    pub average_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub slowest: Vec<Sample>,
    pub fastest: Vec<Sample>,
    pub by_operation: HashMap<String, OperationBreakdown>,
}

/// Linear-interpolated percentile (p50/p95/p99) over a value sequence
/// already sorted ascending.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let frac = rank - lower as f64;
    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}

/// Capped append-only performance log. Oldest samples drop once
/// `MAX_SAMPLES` is exceeded; `dashboard()` recomputes statistics on demand
/// rather than maintaining running aggregates, since eviction would make
/// incremental min/max/percentile bookkeeping incorrect.
pub struct PerformanceMetrics {
    samples: RwLock<VecDeque<Sample>>,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            samples: RwLock::new(VecDeque::with_capacity(MAX_SAMPLES)),
        }
    }

    pub fn record(&self, operation: impl Into<String>, duration_ms: f64) {
        let operation = operation.into();
        metrics::histogram!("operation_duration_ms", "operation" => operation.clone())
            .record(duration_ms);

        let mut samples = self.samples.write().unwrap();
        if samples.len() >= MAX_SAMPLES {
            samples.pop_front();
        }
        samples.push_back(Sample {
            operation,
            duration_ms,
            timestamp: Utc::now(),
        });
    }

    pub fn dashboard(&self) -> Dashboard {
        let samples = self.samples.read().unwrap();
        if samples.is_empty() {
            return Dashboard::default();
        }

        let mut durations: Vec<f64> = samples.iter().map(|s| s.duration_ms).collect();
        durations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = durations.len();
        let average_ms = durations.iter().sum::<f64>() / count as f64;
        let min_ms = durations[0];
        let max_ms = durations[count - 1];
        let p50_ms = percentile(&durations, 0.50);
        let p95_ms = percentile(&durations, 0.95);
        let p99_ms = percentile(&durations, 0.99);

        let mut slowest: Vec<Sample> = samples
            .iter()
            .filter(|s| s.duration_ms > p95_ms)
            .cloned()
            .collect();
        slowest.sort_by(|a, b| b.duration_ms.partial_cmp(&a.duration_ms).unwrap());
        slowest.truncate(SLOW_FAST_LIMIT);

        let mut fastest: Vec<Sample> = samples
            .iter()
            .filter(|s| s.duration_ms < p50_ms)
            .cloned()
            .collect();
        fastest.sort_by(|a, b| a.duration_ms.partial_cmp(&b.duration_ms).unwrap());
        fastest.truncate(SLOW_FAST_LIMIT);

        let mut by_operation: HashMap<String, Vec<f64>> = HashMap::new();
        for sample in samples.iter() {
            by_operation
                .entry(sample.operation.clone())
                .or_default()
                .push(sample.duration_ms);
        }
        let by_operation = by_operation
            .into_iter()
            .map(|(op, durations)| {
                let n = durations.len();
                let sum: f64 = durations.iter().sum();
                let min = durations.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = durations.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                (
                    op,
                    OperationBreakdown {
                        count: n,
                        average_ms: sum / n as f64,
                        min_ms: min,
                        max_ms: max,
                    },
                )
            })
            .collect();

        Dashboard {
            count,
            average_ms,
            min_ms,
            max_ms,
            p50_ms,
            p95_ms,
            p99_ms,
            slowest,
            fastest,
            by_operation,
        }
    }

    pub fn save_snapshot(&self, path: &Path) -> ObservabilityResult<()> {
        let dashboard = self.dashboard();
        let body = serde_json::to_vec_pretty(&dashboard)
            .map_err(|e| ObservabilityError::Snapshot(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_computes_basic_stats() {
        let metrics = PerformanceMetrics::new();
        for d in [10.0, 20.0, 30.0, 40.0, 50.0] {
            metrics.record("search", d);
        }
        let dash = metrics.dashboard();
        assert_eq!(dash.count, 5);
        assert_eq!(dash.min_ms, 10.0);
        assert_eq!(dash.max_ms, 50.0);
        assert_eq!(dash.average_ms, 30.0);
        assert_eq!(dash.p50_ms, 30.0);
    }

    #[test]
    fn per_operation_breakdown_separates_operations() {
        let metrics = PerformanceMetrics::new();
        metrics.record("search", 10.0);
        metrics.record("upsert", 100.0);
        let dash = metrics.dashboard();
        assert_eq!(dash.by_operation["search"].count, 1);
        assert_eq!(dash.by_operation["upsert"].count, 1);
    }

    #[test]
    fn snapshot_roundtrips_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let metrics = PerformanceMetrics::new();
        metrics.record("search", 5.0);
        metrics.save_snapshot(&path).unwrap();
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.contains("\"count\""));
    }
}
