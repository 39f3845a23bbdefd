use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::DistanceMetric;
use crate::distance::distance;

/// `f32` wrapper giving a total order (NaN-free floats compare fine with
/// `partial_cmp`, but `BinaryHeap` needs `Ord`) plus a deterministic
/// id-based tiebreak, so equal-distance candidates always order the same
/// way regardless of insertion order.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    dist: f32,
    id: u32,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .partial_cmp(&other.dist)
            .unwrap_or(Ordering::Equal)
            .then(self.id.cmp(&other.id))
    }
}

/// Deterministic level assignment: `floor(-ln(U) * Ml)` with `U` drawn
/// uniform in `(0, 1]` from a seeded RNG, so a graph built twice from the
/// same seed and insert order is identical.
pub fn assign_level(rng: &mut StdRng, ml: f64) -> usize {
    let u: f64 = 1.0 - rng.gen::<f64>(); // (0, 1]
    (-u.ln() * ml).floor().max(0.0) as usize
}

/// Hand-rolled HNSW graph: per-level adjacency lists over a dense u32 id
/// space. The caller (index.rs) owns the actual vector storage and passes
/// it in by reference on every call, so the graph itself is just topology.
#[derive(Default, Clone, Serialize, Deserialize)]
pub struct HnswGraph {
    m: usize,
    metric: DistanceMetric,
    layers: Vec<HashMap<u32, Vec<u32>>>,
    node_level: HashMap<u32, usize>,
    entry_point: Option<u32>,
}

impl HnswGraph {
    pub fn new(m: usize, metric: DistanceMetric) -> Self {
        Self {
            m: m.max(1),
            metric,
            layers: Vec::new(),
            node_level: HashMap::new(),
            entry_point: None,
        }
    }

    pub fn rng_for_seed(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    pub fn is_empty(&self) -> bool {
        self.entry_point.is_none()
    }

    pub fn len(&self) -> usize {
        self.node_level.len()
    }

    fn dist(&self, vectors: &HashMap<u32, Vec<f32>>, a: u32, query: &[f32]) -> f32 {
        distance(self.metric, &vectors[&a], query)
    }

    pub fn insert(&mut self, id: u32, level: usize, vectors: &HashMap<u32, Vec<f32>>) {
        while self.layers.len() <= level {
            self.layers.push(HashMap::new());
        }
        self.node_level.insert(id, level);
        let query = vectors[&id].clone();

        let Some(entry) = self.entry_point else {
            for l in self.layers.iter_mut().take(level + 1) {
                l.entry(id).or_default();
            }
            self.entry_point = Some(id);
            return;
        };

        let entry_level = self.node_level[&entry];
        let mut current = entry;

        for l in (level + 1..=entry_level).rev() {
            current = self.greedy_nearest(current, &query, l, vectors);
        }

        let top_shared = level.min(entry_level);
        for l in (0..=top_shared).rev() {
            let candidates = self.search_layer(vec![current], &query, l, self.m, vectors);
            self.layers[l].entry(id).or_default();
            for cand in candidates.iter().take(self.m) {
                self.connect(l, id, cand.id, vectors);
            }
            if let Some(nearest) = candidates.first() {
                current = nearest.id;
            }
        }

        for l in (entry_level + 1)..=level {
            self.layers[l].entry(id).or_default();
        }
        if level > entry_level {
            self.entry_point = Some(id);
        }
    }

    /// Prunes `node`'s neighbor list at `layer` back down to `m` entries by
    /// distance, so every insert keeps exactly `M` out-links per level.
    fn connect(&mut self, layer: usize, a: u32, b: u32, vectors: &HashMap<u32, Vec<f32>>) {
        for (from, to) in [(a, b), (b, a)] {
            let entry = self.layers[layer].entry(from).or_default();
            if !entry.contains(&to) {
                entry.push(to);
            }
            if entry.len() > self.m {
                let query = vectors[&from].clone();
                entry.sort_by(|&x, &y| {
                    let dx = distance(self.metric, &vectors[&x], &query);
                    let dy = distance(self.metric, &vectors[&y], &query);
                    dx.partial_cmp(&dy).unwrap_or(Ordering::Equal).then(x.cmp(&y))
                });
                entry.truncate(self.m);
            }
        }
    }

    fn greedy_nearest(
        &self,
        start: u32,
        query: &[f32],
        layer: usize,
        vectors: &HashMap<u32, Vec<f32>>,
    ) -> u32 {
        let mut current = start;
        let mut current_dist = self.dist(vectors, current, query);
        loop {
            let neighbors = match self.layers.get(layer).and_then(|l| l.get(&current)) {
                Some(n) => n.clone(),
                None => break,
            };
            let mut improved = false;
            for n in neighbors {
                let d = self.dist(vectors, n, query);
                if d < current_dist || (d == current_dist && n < current) {
                    current = n;
                    current_dist = d;
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }
        current
    }

    /// Best-first search bounded by `ef`, returning up to `ef` nearest
    /// neighbors at `layer` sorted nearest-first (ties by id).
    fn search_layer(
        &self,
        entry_points: Vec<u32>,
        query: &[f32],
        layer: usize,
        ef: usize,
        vectors: &HashMap<u32, Vec<f32>>,
    ) -> Vec<Candidate> {
        let mut visited: HashSet<u32> = entry_points.iter().copied().collect();
        let mut candidates: BinaryHeap<std::cmp::Reverse<Candidate>> = BinaryHeap::new();
        let mut found: BinaryHeap<Candidate> = BinaryHeap::new();

        for &ep in &entry_points {
            let d = self.dist(vectors, ep, query);
            let c = Candidate { dist: d, id: ep };
            candidates.push(std::cmp::Reverse(c));
            found.push(c);
        }

        while let Some(std::cmp::Reverse(current)) = candidates.pop() {
            if let Some(worst) = found.peek() {
                if found.len() >= ef && current.dist > worst.dist {
                    break;
                }
            }
            let neighbors = match self.layers.get(layer).and_then(|l| l.get(&current.id)) {
                Some(n) => n.clone(),
                None => continue,
            };
            for n in neighbors {
                if !visited.insert(n) {
                    continue;
                }
                let d = self.dist(vectors, n, query);
                let cand = Candidate { dist: d, id: n };
                let should_add = found.len() < ef
                    || found
                        .peek()
                        .map(|worst| cand.dist < worst.dist)
                        .unwrap_or(true);
                if should_add {
                    candidates.push(std::cmp::Reverse(cand));
                    found.push(cand);
                    if found.len() > ef {
                        found.pop();
                    }
                }
            }
        }

        // `into_sorted_vec` sorts ascending by `Ord`, and `Candidate::cmp` treats
        // smaller distance as "less" — so this is already nearest-first.
        found.into_sorted_vec()
    }

    /// Query the full graph: greedy descent to level 0, then a best-first
    /// search at level 0 bounded by `ef_search`, returning the `k` nearest.
    pub fn query(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
        vectors: &HashMap<u32, Vec<f32>>,
    ) -> Vec<(u32, f32)> {
        let Some(entry) = self.entry_point else {
            return Vec::new();
        };
        let entry_level = self.node_level[&entry];
        let mut current = entry;
        for l in (1..=entry_level).rev() {
            current = self.greedy_nearest(current, query, l, vectors);
        }
        let ef = ef_search.max(k);
        let mut hits = self.search_layer(vec![current], query, 0, ef, vectors);
        hits.truncate(k);
        hits.into_iter().map(|c| (c.id, c.dist)).collect()
    }

    pub fn remove(&mut self, id: u32) {
        self.node_level.remove(&id);
        for layer in &mut self.layers {
            layer.remove(&id);
            for neighbors in layer.values_mut() {
                neighbors.retain(|&n| n != id);
            }
        }
        if self.entry_point == Some(id) {
            self.entry_point = self
                .node_level
                .iter()
                .max_by_key(|(_, &lvl)| lvl)
                .map(|(&id, _)| id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vecs(pairs: &[(u32, [f32; 2])]) -> HashMap<u32, Vec<f32>> {
        pairs.iter().map(|(id, v)| (*id, v.to_vec())).collect()
    }

    #[test]
    fn query_returns_nearest_by_euclidean() {
        let vectors = vecs(&[
            (0, [0.0, 0.0]),
            (1, [1.0, 0.0]),
            (2, [10.0, 10.0]),
            (3, [0.5, 0.0]),
        ]);
        let mut graph = HnswGraph::new(4, DistanceMetric::Euclidean);
        for id in [0u32, 1, 2, 3] {
            graph.insert(id, 0, &vectors);
        }
        let hits = graph.query(&[0.4, 0.0], 2, 10, &vectors);
        assert_eq!(hits[0].0, 3);
    }

    #[test]
    fn remove_clears_entry_point() {
        let vectors = vecs(&[(0, [0.0, 0.0])]);
        let mut graph = HnswGraph::new(4, DistanceMetric::Euclidean);
        graph.insert(0, 0, &vectors);
        graph.remove(0);
        assert!(graph.is_empty());
    }

    #[test]
    fn level_assignment_is_deterministic_for_seed() {
        let mut rng_a = HnswGraph::rng_for_seed(42);
        let mut rng_b = HnswGraph::rng_for_seed(42);
        let levels_a: Vec<usize> = (0..10).map(|_| assign_level(&mut rng_a, 0.25)).collect();
        let levels_b: Vec<usize> = (0..10).map(|_| assign_level(&mut rng_b, 0.25)).collect();
        assert_eq!(levels_a, levels_b);
    }
}
