use std::time::Duration;

use serde::{Deserialize, Serialize};

use catalog_store::StoreConfig;
use catalog_vector::{DistanceMetric, Mode, VectorConfig};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(flatten)]
    pub store: StoreConfig,
    /// Root used to scope multi-tenant private-author subtrees; empty
    /// means "same as `data_root`".
    #[serde(default)]
    pub base_root: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            base_root: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnswSection {
    #[serde(default = "default_m")]
    pub m: usize,
    #[serde(default = "default_ml")]
    pub ml: f64,
    #[serde(default = "default_ef_search")]
    pub ef_search: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
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

impl Default for HnswSection {
    fn default() -> Self {
        Self {
            m: default_m(),
            ml: default_ml(),
            ef_search: default_ef_search(),
            seed: 0,
            enabled: true,
        }
    }
}

fn default_dimension() -> usize {
    384
}
fn default_hybrid_threshold() -> usize {
    100
}
fn default_index_path() -> String {
    "vector.index".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSection {
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default)]
    pub metric: DistanceMetric,
    #[serde(default = "default_hybrid_threshold")]
    pub hybrid_threshold: usize,
    #[serde(default)]
    pub hnsw: HnswSection,
    #[serde(default = "default_true")]
    pub persistence_enabled: bool,
    #[serde(default = "default_index_path")]
    pub index_path: String,
}

impl Default for VectorSection {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            metric: DistanceMetric::default(),
            hybrid_threshold: default_hybrid_threshold(),
            hnsw: HnswSection::default(),
            persistence_enabled: true,
            index_path: default_index_path(),
        }
    }
}

impl VectorSection {
    pub fn to_vector_config(&self) -> VectorConfig {
        VectorConfig {
            dimension: self.dimension,
            mode: if self.hnsw.enabled { Mode::Auto } else { Mode::Linear },
            metric: self.metric,
            hybrid_threshold: self.hybrid_threshold,
            m: self.hnsw.m,
            ml: self.hnsw.ml,
            ef_search: self.hnsw.ef_search,
            seed: self.hnsw.seed,
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.75
}
fn default_max_results() -> usize {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridSearchSection {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_hybrid_threshold")]
    pub auto_switch_threshold: usize,
}

impl Default for HybridSearchSection {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            similarity_threshold: default_similarity_threshold(),
            max_results: default_max_results(),
            auto_switch_threshold: default_hybrid_threshold(),
        }
    }
}

fn default_scorer_name() -> String {
    "heuristic".to_string()
}
fn default_fallback_chain() -> Vec<String> {
    vec!["neural".to_string(), "heuristic".to_string()]
}
fn default_cleanup_interval() -> u64 {
    3600
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySection {
    #[serde(default = "default_scorer_name")]
    pub default_scorer: String,
    #[serde(default = "default_fallback_chain")]
    pub fallback_chain: Vec<String>,
    #[serde(default)]
    pub backend_paths: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub auto_archival: bool,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

impl Default for QualitySection {
    fn default() -> Self {
        Self {
            default_scorer: default_scorer_name(),
            fallback_chain: default_fallback_chain(),
            backend_paths: std::collections::HashMap::new(),
            auto_archival: false,
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

fn default_high_retention() -> u32 {
    365
}
fn default_medium_retention() -> u32 {
    180
}
fn default_low_retention() -> u32 {
    90
}
fn default_quality_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSection {
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,
    #[serde(default = "default_high_retention")]
    pub high_retention_days: u32,
    #[serde(default = "default_medium_retention")]
    pub medium_retention_days: u32,
    #[serde(default = "default_low_retention")]
    pub low_retention_days: u32,
    #[serde(default)]
    pub auto_cleanup: bool,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

impl Default for RetentionSection {
    fn default() -> Self {
        Self {
            quality_threshold: default_quality_threshold(),
            high_retention_days: default_high_retention(),
            medium_retention_days: default_medium_retention(),
            low_retention_days: default_low_retention(),
            auto_cleanup: false,
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

impl RetentionSection {
    pub fn sweeper_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

fn default_min_content_length() -> usize {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateDetectionSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for DuplicateDetectionSection {
    fn default() -> Self {
        Self {
            enabled: false,
            similarity_threshold: default_similarity_threshold(),
            min_content_length: default_min_content_length(),
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterAlgorithm {
    Dbscan,
    Kmeans,
}

impl Default for ClusterAlgorithm {
    fn default() -> Self {
        ClusterAlgorithm::Dbscan
    }
}

fn default_epsilon() -> f64 {
    0.3
}
fn default_num_clusters() -> usize {
    8
}
fn default_max_iterations() -> usize {
    50
}
fn default_min_cluster_size() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringSection {
    #[serde(default)]
    pub algorithm: ClusterAlgorithm,
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_num_clusters")]
    pub num_clusters: usize,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for ClusteringSection {
    fn default() -> Self {
        Self {
            algorithm: ClusterAlgorithm::default(),
            min_cluster_size: default_min_cluster_size(),
            epsilon: default_epsilon(),
            num_clusters: default_num_clusters(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_ring_capacity() -> usize {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_ring_capacity")]
    pub ring_capacity: usize,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            ring_capacity: default_ring_capacity(),
        }
    }
}

/// Root configuration aggregate. Loaded from an optional `catalog.toml`
/// plus `CATALOG_*` environment overrides, file values taking precedence
/// over defaults and environment variables taking precedence over the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub vector: VectorSection,
    #[serde(default)]
    pub hybrid_search: HybridSearchSection,
    #[serde(default)]
    pub quality: QualitySection,
    #[serde(default)]
    pub retention: RetentionSection,
    #[serde(default)]
    pub duplicate_detection: DuplicateDetectionSection,
    #[serde(default)]
    pub clustering: ClusteringSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl CatalogConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        config::Config::builder()
            .add_source(config::File::with_name("catalog").required(false))
            .add_source(config::Environment::with_prefix("CATALOG").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let cfg = CatalogConfig::default();
        assert_eq!(cfg.vector.dimension, 384);
        assert_eq!(cfg.retention.high_retention_days, 365);
        assert_eq!(cfg.logging.ring_capacity, 1000);
    }
}
