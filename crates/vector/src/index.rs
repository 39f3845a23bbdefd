use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::config::{Mode, VectorConfig};
use crate::distance::distance;
use crate::error::{VectorError, VectorResult};
use crate::graph::HnswGraph;
use crate::manifest::{Manifest, FORMAT_VERSION};

#[derive(Serialize, Deserialize)]
struct Snapshot {
    config: VectorConfig,
    vectors: HashMap<u32, Vec<f32>>,
    id_to_u32: HashMap<String, u32>,
    u32_to_id: HashMap<u32, String>,
    next_u32: u32,
    graph: HnswGraph,
}

struct State {
    vectors: HashMap<u32, Vec<f32>>,
    id_to_u32: HashMap<String, u32>,
    u32_to_id: HashMap<u32, String>,
    next_u32: u32,
    graph: HnswGraph,
    rng: rand::rngs::StdRng,
}

#[derive(Debug, Clone, Default)]
pub struct VectorStats {
    pub vector_count: usize,
    pub dimension: usize,
    pub effective_mode: &'static str,
    pub graph_nodes: usize,
}

/// Hybrid linear/HNSW vector index. Below `hybrid_threshold`
/// vectors it answers `query` by exact linear scan; at or above it, the
/// HNSW graph. `Mode::Linear`/`Mode::Hnsw` force one or the other
/// regardless of count.
///
/// Writers serialize on the single `RwLock`; readers (queries, stats) take
/// a shared lock and proceed concurrently.
pub struct VectorIndex {
    config: VectorConfig,
    state: RwLock<State>,
}

impl VectorIndex {
    pub fn new(config: VectorConfig) -> Self {
        let rng = HnswGraph::rng_for_seed(config.seed);
        let graph = HnswGraph::new(config.m, config.metric);
        Self {
            state: RwLock::new(State {
                vectors: HashMap::new(),
                id_to_u32: HashMap::new(),
                u32_to_id: HashMap::new(),
                next_u32: 0,
                graph,
                rng,
            }),
            config,
        }
    }

    fn effective_mode(&self, count: usize) -> Mode {
        match self.config.mode {
            Mode::Linear => Mode::Linear,
            Mode::Hnsw => Mode::Hnsw,
            Mode::Auto => {
                if count >= self.config.hybrid_threshold {
                    Mode::Hnsw
                } else {
                    Mode::Linear
                }
            }
        }
    }

    pub fn upsert(&self, id: &str, vector: Vec<f32>) -> VectorResult<()> {
        if vector.len() != self.config.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.config.dimension,
                got: vector.len(),
            });
        }
        let mut state = self.state.write().unwrap();

        let internal_id = if let Some(&existing) = state.id_to_u32.get(id) {
            state.graph.remove(existing);
            existing
        } else {
            let n = state.next_u32;
            state.next_u32 += 1;
            state.id_to_u32.insert(id.to_string(), n);
            state.u32_to_id.insert(n, id.to_string());
            n
        };

        state.vectors.insert(internal_id, vector);
        let level = crate::graph::assign_level(&mut state.rng, self.config.ml);
        let vectors_snapshot = state.vectors.clone();
        state.graph.insert(internal_id, level, &vectors_snapshot);
        Ok(())
    }

    pub fn remove(&self, id: &str) -> VectorResult<()> {
        let mut state = self.state.write().unwrap();
        let internal_id = state
            .id_to_u32
            .remove(id)
            .ok_or_else(|| VectorError::NotFound(id.to_string()))?;
        state.u32_to_id.remove(&internal_id);
        state.vectors.remove(&internal_id);
        state.graph.remove(internal_id);
        Ok(())
    }

    pub fn query(&self, vector: &[f32], k: usize) -> VectorResult<Vec<(String, f32)>> {
        if vector.len() != self.config.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.config.dimension,
                got: vector.len(),
            });
        }
        let state = self.state.read().unwrap();
        let mode = self.effective_mode(state.vectors.len());

        let hits: Vec<(u32, f32)> = match mode {
            Mode::Linear | Mode::Auto => self.linear_scan(&state, vector, k),
            Mode::Hnsw => {
                let hits = state
                    .graph
                    .query(vector, k, self.config.ef_search, &state.vectors);
                if hits.is_empty() && !state.vectors.is_empty() {
                    self.linear_scan(&state, vector, k)
                } else {
                    hits
                }
            }
        };

        Ok(hits
            .into_iter()
            .filter_map(|(internal, dist)| {
                state.u32_to_id.get(&internal).map(|id| (id.clone(), dist))
            })
            .collect())
    }

    fn linear_scan(&self, state: &State, vector: &[f32], k: usize) -> Vec<(u32, f32)> {
        let mut scored: Vec<(u32, f32)> = state
            .vectors
            .iter()
            .map(|(&id, v)| (id, distance(self.config.metric, v, vector)))
            .collect();
        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);
        scored
    }

    pub fn stats(&self) -> VectorStats {
        let state = self.state.read().unwrap();
        let mode = self.effective_mode(state.vectors.len());
        VectorStats {
            vector_count: state.vectors.len(),
            dimension: self.config.dimension,
            effective_mode: match mode {
                Mode::Linear => "linear",
                Mode::Hnsw => "hnsw",
                Mode::Auto => "auto",
            },
            graph_nodes: state.graph.len(),
        }
    }

    /// Snapshots the graph and vectors under the shared writer lock and
    /// writes it plus a manifest sidecar to `path`.
    pub fn save(&self, path: &Path) -> VectorResult<()> {
        let state = self.state.read().unwrap();
        let snapshot = Snapshot {
            config: self.config.clone(),
            vectors: state.vectors.clone(),
            id_to_u32: state.id_to_u32.clone(),
            u32_to_id: state.u32_to_id.clone(),
            next_u32: state.next_u32,
            graph: state.graph.clone(),
        };
        drop(state);

        let body = bincode::serialize(&snapshot).map_err(ser_err)?;
        let compressed = zstd::encode_all(body.as_slice(), 0)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, compressed)?;

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            dimension: self.config.dimension,
            metric: self.config.metric,
            mode: self.config.mode,
            vector_count: snapshot.vectors.len(),
            m: self.config.m,
            ml: self.config.ml,
            ef_search: self.config.ef_search,
            seed: self.config.seed,
        };
        let manifest_path = manifest_path_for(path);
        let manifest_body = serde_json::to_vec_pretty(&manifest).map_err(|e| {
            VectorError::Serialization(format!("manifest encode failed: {e}"))
        })?;
        fs::write(manifest_path, manifest_body)?;
        Ok(())
    }

    /// Restores a previously-saved graph. If the restored vector count is
    /// below `hybrid_threshold`, queries transparently fall back to linear
    /// mode until enough vectors accumulate again ("The index is
    /// allowed to drop to linear mode after load").
    pub fn load(path: &Path) -> VectorResult<Self> {
        let manifest_path = manifest_path_for(path);
        let manifest_body = fs::read(&manifest_path)?;
        let manifest: Manifest = serde_json::from_slice(&manifest_body)
            .map_err(|e| VectorError::Serialization(format!("manifest decode failed: {e}")))?;
        manifest.check_compatible()?;

        let compressed = fs::read(path)?;
        let body = zstd::decode_all(compressed.as_slice())?;
        let snapshot: Snapshot = bincode::deserialize(&body).map_err(ser_err)?;

        let rng = HnswGraph::rng_for_seed(snapshot.config.seed);
        Ok(Self {
            config: snapshot.config,
            state: RwLock::new(State {
                vectors: snapshot.vectors,
                id_to_u32: snapshot.id_to_u32,
                u32_to_id: snapshot.u32_to_id,
                next_u32: snapshot.next_u32,
                graph: snapshot.graph,
                rng,
            }),
        })
    }
}

fn manifest_path_for(path: &Path) -> std::path::PathBuf {
    let mut manifest_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("graph")
        .to_string();
    manifest_name.push_str(".manifest.json");
    path.with_file_name(manifest_name)
}

fn ser_err(e: bincode::Error) -> VectorError {
    VectorError::Serialization(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(dim: usize) -> VectorConfig {
        let mut c = VectorConfig::new(dim);
        c.hybrid_threshold = 3;
        c
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let idx = VectorIndex::new(cfg(3));
        let err = idx.upsert("a", vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, VectorError::DimensionMismatch { .. }));
    }

    #[test]
    fn linear_mode_below_threshold_finds_nearest() {
        let idx = VectorIndex::new(cfg(2));
        idx.upsert("a", vec![0.0, 0.0]).unwrap();
        idx.upsert("b", vec![10.0, 10.0]).unwrap();
        let hits = idx.query(&[0.1, 0.1], 1).unwrap();
        assert_eq!(hits[0].0, "a");
    }

    #[test]
    fn hnsw_mode_at_threshold_finds_nearest() {
        let idx = VectorIndex::new(cfg(2));
        for i in 0..5 {
            idx.upsert(&format!("v{i}"), vec![i as f32, 0.0]).unwrap();
        }
        let stats = idx.stats();
        assert_eq!(stats.effective_mode, "hnsw");
        let hits = idx.query(&[0.1, 0.0], 1).unwrap();
        assert_eq!(hits[0].0, "v0");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let idx = VectorIndex::new(cfg(2));
        idx.upsert("a", vec![1.0, 1.0]).unwrap();
        idx.save(&path).unwrap();

        let loaded = VectorIndex::load(&path).unwrap();
        assert_eq!(loaded.stats().vector_count, 1);
        let hits = loaded.query(&[1.0, 1.0], 1).unwrap();
        assert_eq!(hits[0].0, "a");
    }

    #[test]
    fn remove_then_query_excludes_removed() {
        let idx = VectorIndex::new(cfg(2));
        idx.upsert("a", vec![0.0, 0.0]).unwrap();
        idx.upsert("b", vec![1.0, 1.0]).unwrap();
        idx.remove("a").unwrap();
        let hits = idx.query(&[0.0, 0.0], 2).unwrap();
        assert!(hits.iter().all(|(id, _)| id != "a"));
    }
}
