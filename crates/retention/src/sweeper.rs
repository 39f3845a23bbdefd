use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::policy::RetentionPolicy;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("sweep source error: {0}")]
    Source(String),
}

#[derive(Debug, Clone)]
pub struct SweepCandidate {
    pub id: String,
    pub score: f64,
    pub age_days: f64,
    pub archived: bool,
}

/// Abstracts the element store enough for the sweeper to walk memory-type
/// elements without this crate depending on `catalog-store` directly; the
/// root crate wires the real implementation.
#[async_trait]
pub trait SweepSource: Send + Sync {
    async fn memory_elements(&self) -> Result<Vec<SweepCandidate>, SweepError>;
    async fn archive(&self, id: &str) -> Result<(), SweepError>;
    async fn delete(&self, id: &str) -> Result<(), SweepError>;
}

#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(3600),
        }
    }
}

pub struct Sweeper {
    config: SweeperConfig,
    policy: RetentionPolicy,
    source: Arc<dyn SweepSource>,
}

#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub archived: usize,
    pub deleted: usize,
}

impl Sweeper {
    pub fn new(config: SweeperConfig, policy: RetentionPolicy, source: Arc<dyn SweepSource>) -> Self {
        Self {
            config,
            policy,
            source,
        }
    }

    pub async fn run_once(&self) -> Result<SweepReport, SweepError> {
        let mut report = SweepReport::default();
        for candidate in self.source.memory_elements().await? {
            let band = self.policy.band_for(candidate.score);
            if candidate.age_days >= band.retention_days as f64 {
                self.source.delete(&candidate.id).await?;
                report.deleted += 1;
            } else if !candidate.archived && candidate.age_days >= band.archive_after_days as f64 {
                self.source.archive(&candidate.id).await?;
                report.archived += 1;
            }
        }
        Ok(report)
    }

    /// Runs `run_once` on `config.interval` until `token` is cancelled.
    /// Disabled sweepers (the default) never spawn this loop at all.
    pub fn spawn(self: Arc<Self>, token: CancellationToken) -> Option<tokio::task::JoinHandle<()>> {
        if !self.config.enabled {
            return None;
        }
        let interval = self.config.interval;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("retention sweeper shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        match self.run_once().await {
                            Ok(report) => info!(archived = report.archived, deleted = report.deleted, "retention sweep complete"),
                            Err(e) => warn!(error = %e, "retention sweep failed"),
                        }
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeSource {
        elements: Vec<SweepCandidate>,
        archived: Mutex<Vec<String>>,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SweepSource for FakeSource {
        async fn memory_elements(&self) -> Result<Vec<SweepCandidate>, SweepError> {
            Ok(self.elements.clone())
        }
        async fn archive(&self, id: &str) -> Result<(), SweepError> {
            self.archived.lock().unwrap().push(id.to_string());
            Ok(())
        }
        async fn delete(&self, id: &str) -> Result<(), SweepError> {
            self.deleted.lock().unwrap().push(id.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn old_low_quality_element_is_deleted() {
        let source = Arc::new(FakeSource {
            elements: vec![SweepCandidate {
                id: "e1".into(),
                score: 0.2,
                age_days: 200.0,
                archived: false,
            }],
            archived: Mutex::new(vec![]),
            deleted: Mutex::new(vec![]),
        });
        let sweeper = Sweeper::new(SweeperConfig::default(), RetentionPolicy::default(), source.clone());
        let report = sweeper.run_once().await.unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(source.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn past_archive_threshold_but_not_retention_archives() {
        let source = Arc::new(FakeSource {
            elements: vec![SweepCandidate {
                id: "e1".into(),
                score: 0.9,
                age_days: 200.0,
                archived: false,
            }],
            archived: Mutex::new(vec![]),
            deleted: Mutex::new(vec![]),
        });
        let sweeper = Sweeper::new(SweeperConfig::default(), RetentionPolicy::default(), source.clone());
        let report = sweeper.run_once().await.unwrap();
        assert_eq!(report.archived, 1);
        assert_eq!(report.deleted, 0);
    }
}
