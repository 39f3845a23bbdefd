use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use catalog_lexical::{ScoredHit, TfidfIndex};
use catalog_observability::{Dashboard, LogEntry, LogFilter, PerformanceMetrics, RingLogBuffer};
use catalog_quality::{Score, ScoreInput, ScorerChain, Signals};
use catalog_retention::{Band, RetentionPolicy, SweepCandidate, SweepError, SweepSource};
use catalog_store::{Element, ElementStore, ElementType, ListFilter};
use catalog_vector::{VectorIndex, VectorStats};

use crate::config::CatalogConfig;
use crate::error::CatalogResult;

fn retention_policy_from_config(cfg: &crate::config::RetentionSection) -> RetentionPolicy {
    RetentionPolicy::new(vec![
        Band {
            min: 0.7,
            max: 1.1,
            retention_days: cfg.high_retention_days,
            archive_after_days: cfg.high_retention_days / 2,
        },
        Band {
            min: 0.5,
            max: 0.7,
            retention_days: cfg.medium_retention_days,
            archive_after_days: cfg.medium_retention_days / 2,
        },
        Band {
            min: 0.0,
            max: 0.5,
            retention_days: cfg.low_retention_days,
            archive_after_days: cfg.low_retention_days / 2,
        },
    ])
}

/// Shared state behind the tool surface: store, both search indices, the
/// quality scoring chain, retention policy, and the observability surfaces,
/// all composed behind a single struct.
pub struct CatalogService {
    config: CatalogConfig,
    store: Box<dyn ElementStore>,
    lexical: RwLock<TfidfIndex>,
    vector: VectorIndex,
    quality: ScorerChain,
    retention_policy: RetentionPolicy,
    logs: RingLogBuffer,
    metrics: PerformanceMetrics,
}

impl CatalogService {
    pub fn new(
        config: CatalogConfig,
        store: Box<dyn ElementStore>,
        quality: ScorerChain,
    ) -> CatalogResult<Self> {
        let mut lexical = TfidfIndex::new();
        for element in store.list(&ListFilter::default())? {
            // Startup rebuild: a document already present from a previous
            // run (same id reused across restarts inside one process) is
            // not expected, so `add` failing here would indicate a real bug
            // rather than a recoverable condition.
            lexical.add(&element.id, &element.searchable_text())?;
        }

        let vector = VectorIndex::new(config.vector.to_vector_config());
        let retention_policy = retention_policy_from_config(&config.retention);
        let logs = RingLogBuffer::new(config.logging.ring_capacity);
        let metrics = PerformanceMetrics::new();

        Ok(Self {
            config,
            store,
            lexical: RwLock::new(lexical),
            vector,
            quality,
            retention_policy,
            logs,
            metrics,
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn create_element(
        &self,
        element: Element,
        embedding: Option<Vec<f32>>,
    ) -> CatalogResult<Element> {
        let created = self.store.create(element)?;
        self.lexical
            .write()
            .unwrap()
            .add(&created.id, &created.searchable_text())?;
        if let Some(vector) = embedding {
            self.vector.upsert(&created.id, vector)?;
        }
        Ok(created)
    }

    pub fn update_element(
        &self,
        element: Element,
        embedding: Option<Vec<f32>>,
    ) -> CatalogResult<Element> {
        let updated = self.store.update(element)?;
        {
            let mut lexical = self.lexical.write().unwrap();
            let _ = lexical.remove(&updated.id);
            lexical.add(&updated.id, &updated.searchable_text())?;
        }
        if let Some(vector) = embedding {
            self.vector.upsert(&updated.id, vector)?;
        }
        Ok(updated)
    }

    pub fn delete_element(&self, id: &str) -> CatalogResult<()> {
        self.store.delete(id)?;
        let _ = self.lexical.write().unwrap().remove(id);
        let _ = self.vector.remove(id);
        Ok(())
    }

    pub fn get_element(&self, id: &str) -> CatalogResult<Element> {
        Ok(self.store.get(id)?)
    }

    pub fn list_elements(&self, filter: &ListFilter) -> CatalogResult<Vec<Element>> {
        Ok(self.store.list(filter)?)
    }

    /// Keyword search over the store's inverted index, filtered and paged
    /// the same way `list_elements` is.
    pub fn search_elements(&self, query: &str, filter: &ListFilter) -> CatalogResult<Vec<Element>> {
        Ok(self.store.search(query, filter)?)
    }

    /// TF-IDF ranked search with highlights.
    pub fn search_capability_index(&self, query: &str, limit: usize) -> Vec<ScoredHit> {
        self.lexical.write().unwrap().search(query, limit)
    }

    /// Nearest peers by lexical similarity. A nonexistent id returns an
    /// empty result, not an error.
    pub fn find_similar_capabilities(&self, id: &str, limit: usize) -> Vec<ScoredHit> {
        self.lexical
            .write()
            .unwrap()
            .find_similar(id, limit)
            .unwrap_or_default()
    }

    pub fn query_vector(&self, vector: &[f32], k: usize) -> CatalogResult<Vec<(String, f32)>> {
        Ok(self.vector.query(vector, k)?)
    }

    pub fn vector_stats(&self) -> VectorStats {
        self.vector.stats()
    }

    pub async fn score_element(&self, id: &str) -> CatalogResult<Score> {
        let element = self.store.get(id)?;
        let input = ScoreInput {
            text: element.searchable_text(),
            signals: Signals::default(),
        };
        Ok(self.quality.score(&input).await?)
    }

    pub fn retention_band(&self, score: f64) -> Band {
        self.retention_policy.band_for(score)
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        self.retention_policy.clone()
    }

    pub fn log(&self, entry: LogEntry) {
        self.logs.add(entry);
    }

    pub fn list_logs(&self, filter: &LogFilter) -> Vec<LogEntry> {
        self.logs.query(filter)
    }

    pub fn record_metric(&self, operation: impl Into<String>, duration_ms: f64) {
        self.metrics.record(operation, duration_ms);
    }

    pub fn get_performance_dashboard(&self) -> Dashboard {
        self.metrics.dashboard()
    }

    pub fn save_vector_index(&self, path: &std::path::Path) -> CatalogResult<()> {
        Ok(self.vector.save(path)?)
    }

    pub fn save_metrics_snapshot(&self, path: &std::path::Path) -> CatalogResult<()> {
        Ok(self.metrics.save_snapshot(path)?)
    }
}

/// Feeds the retention sweeper from the live store and quality chain
/// without either of those crates depending on each other.
#[async_trait]
impl SweepSource for CatalogService {
    async fn memory_elements(&self) -> Result<Vec<SweepCandidate>, SweepError> {
        let filter = ListFilter {
            element_type: Some(ElementType::Memory),
            ..Default::default()
        };
        let elements = self
            .store
            .list(&filter)
            .map_err(|e| SweepError::Source(e.to_string()))?;

        let mut candidates = Vec::with_capacity(elements.len());
        for element in elements {
            let input = ScoreInput {
                text: element.searchable_text(),
                signals: Signals::default(),
            };
            let score = self
                .quality
                .score(&input)
                .await
                .map(|s| s.value)
                .unwrap_or(0.0);
            let age_days = (Utc::now() - element.updated_at).num_seconds() as f64 / 86_400.0;
            candidates.push(SweepCandidate {
                id: element.id,
                score,
                age_days,
                archived: !element.active,
            });
        }
        Ok(candidates)
    }

    async fn archive(&self, id: &str) -> Result<(), SweepError> {
        let mut element = self
            .store
            .get(id)
            .map_err(|e| SweepError::Source(e.to_string()))?;
        element.active = false;
        self.store
            .update(element)
            .map_err(|e| SweepError::Source(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), SweepError> {
        self.store
            .delete(id)
            .map_err(|e| SweepError::Source(e.to_string()))?;
        let _ = self.lexical.write().unwrap().remove(id);
        let _ = self.vector.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_quality::HeuristicScorer;
    use catalog_store::{ElementBody, InMemoryElementStore};
    use std::collections::BTreeSet;

    fn new_elem(id: &str) -> Element {
        Element {
            id: id.into(),
            element_type: ElementType::Memory,
            name: "Note".into(),
            description: "a note about rust".into(),
            version: "1.0.0".into(),
            author: "alice".into(),
            tags: BTreeSet::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            active: true,
            body: ElementBody::Memory {
                content: "rust async patterns".into(),
                extra: serde_json::Value::Null,
            },
        }
    }

    fn service() -> CatalogService {
        let chain = ScorerChain::new(vec![Box::new(HeuristicScorer::new())]);
        CatalogService::new(
            CatalogConfig::default(),
            Box::new(InMemoryElementStore::default()),
            chain,
        )
        .unwrap()
    }

    #[test]
    fn create_then_search_capability_index_finds_it() {
        let svc = service();
        svc.create_element(new_elem("e1"), None).unwrap();
        let hits = svc.search_capability_index("rust async", 10);
        assert_eq!(hits[0].id, "e1");
    }

    #[test]
    fn delete_removes_from_lexical_index() {
        let svc = service();
        svc.create_element(new_elem("e1"), None).unwrap();
        svc.delete_element("e1").unwrap();
        assert!(svc.search_capability_index("rust async", 10).is_empty());
    }

    #[test]
    fn find_similar_on_missing_id_is_empty_not_error() {
        let svc = service();
        assert!(svc.find_similar_capabilities("nope", 10).is_empty());
    }

    #[tokio::test]
    async fn score_element_uses_heuristic_fallback() {
        let svc = service();
        svc.create_element(new_elem("e1"), None).unwrap();
        let score = svc.score_element("e1").await.unwrap();
        assert_eq!(score.method, "heuristic");
        assert_eq!(score.metadata.get("fallback_used").unwrap(), "heuristic");
    }
}
