use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::cluster::{dbscan, kmeans, ClusterStrategy};
use crate::dedup::{find_duplicates, DuplicatePair};
use crate::kg::{ExtractedGraph, KgConfig, KgExtractor};

/// One element's view as far as consolidation cares: its embedding (for
/// dedup/clustering) and its searchable text (for KG extraction).
#[derive(Debug, Clone)]
pub struct ConsolidationItem {
    pub id: String,
    pub embedding: Vec<f32>,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConsolidationConfig {
    pub dedup_threshold: Option<f64>,
    pub cluster_strategy: Option<ClusterStrategy>,
    pub kg: Option<KgConfig>,
    pub rescore: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConsolidationReport {
    pub duplicates: Vec<DuplicatePair>,
    pub clusters: HashMap<String, i32>,
    pub knowledge_graph: HashMap<String, ExtractedGraph>,
    pub rescored: usize,
}

/// Orchestrates duplicate detection, clustering, knowledge-graph
/// extraction, and quality re-scoring as one offline pass. Runs
/// under a coarse mutex against itself — concurrent `run` calls serialize —
/// while the individual index mutations this pass may trigger still follow
/// their own locks.
pub struct ConsolidationRunner {
    config: ConsolidationConfig,
    lock: Mutex<()>,
    kg_extractor: KgExtractor,
}

impl ConsolidationRunner {
    pub fn new(config: ConsolidationConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
            kg_extractor: KgExtractor::new(),
        }
    }

    /// `rescore` is invoked once per item when `config.rescore` is set; the
    /// caller supplies the closure so this crate never depends directly on
    /// `catalog-quality`.
    pub async fn run<F>(&self, items: &[ConsolidationItem], mut rescore: F) -> ConsolidationReport
    where
        F: FnMut(&str) -> bool,
    {
        let _guard = self.lock.lock().await;
        let mut report = ConsolidationReport::default();

        if let Some(threshold) = self.config.dedup_threshold {
            let embeddings: Vec<(String, Vec<f32>)> = items
                .iter()
                .map(|i| (i.id.clone(), i.embedding.clone()))
                .collect();
            report.duplicates = find_duplicates(&embeddings, threshold);
        }

        if let Some(strategy) = &self.config.cluster_strategy {
            let embeddings: Vec<(String, Vec<f32>)> = items
                .iter()
                .map(|i| (i.id.clone(), i.embedding.clone()))
                .collect();
            report.clusters = match strategy {
                ClusterStrategy::Dbscan(cfg) => dbscan(&embeddings, cfg),
                ClusterStrategy::KMeans(cfg) => kmeans(&embeddings, cfg),
            };
        }

        if let Some(kg_config) = &self.config.kg {
            for item in items {
                let graph = self.kg_extractor.extract(&item.text, kg_config);
                report.knowledge_graph.insert(item.id.clone(), graph);
            }
        }

        if self.config.rescore {
            for item in items {
                if rescore(&item.id) {
                    report.rescored += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::DbscanConfig;

    #[tokio::test]
    async fn composes_dedup_and_cluster_and_kg() {
        let runner = ConsolidationRunner::new(ConsolidationConfig {
            dedup_threshold: Some(0.99),
            cluster_strategy: Some(ClusterStrategy::Dbscan(DbscanConfig {
                epsilon: 0.5,
                min_cluster_size: 2,
            })),
            kg: Some(KgConfig::default()),
            rescore: true,
        });
        let items = vec![
            ConsolidationItem {
                id: "a".into(),
                embedding: vec![1.0, 0.0],
                text: "Alice Smith wrote this note.".into(),
            },
            ConsolidationItem {
                id: "b".into(),
                embedding: vec![1.0, 0.0],
                text: "Alice Smith wrote another note.".into(),
            },
        ];
        let report = runner.run(&items, |_id| true).await;
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.clusters.len(), 2);
        assert_eq!(report.knowledge_graph.len(), 2);
        assert_eq!(report.rescored, 2);
    }
}
