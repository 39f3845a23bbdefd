use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    Cosine,
    Euclidean,
    DotProduct,
}

impl Default for DistanceMetric {
    fn default() -> Self {
        DistanceMetric::Cosine
    }
}

/// Query mode, forceable for testing/ops override ("Mode may
/// also be forced").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Linear,
    Hnsw,
    Auto,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Auto
    }
}

fn default_hybrid_threshold() -> usize {
    100
}
fn default_m() -> usize {
    16
}
fn default_ml() -> f64 {
    0.25
}
fn default_ef_search() -> usize {
    20
}
fn default_seed() -> u64 {
    0x5eed_u64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    pub dimension: usize,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub metric: DistanceMetric,
    #[serde(default = "default_hybrid_threshold")]
    pub hybrid_threshold: usize,
    #[serde(default = "default_m")]
    pub m: usize,
    #[serde(default = "default_ml")]
    pub ml: f64,
    #[serde(default = "default_ef_search")]
    pub ef_search: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl VectorConfig {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            mode: Mode::default(),
            metric: DistanceMetric::default(),
            hybrid_threshold: default_hybrid_threshold(),
            m: default_m(),
            ml: default_ml(),
            ef_search: default_ef_search(),
            seed: default_seed(),
        }
    }
}
