use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct DbscanConfig {
    pub epsilon: f64,
    pub min_cluster_size: usize,
}

#[derive(Debug, Clone)]
pub struct KMeansConfig {
    pub num_clusters: usize,
    pub max_iterations: usize,
}

/// Clustering strategy configuration; consolidation runs at most one of
/// these per pass (DBSCAN or k-means), driven by which config the caller
/// supplies.
#[derive(Debug, Clone)]
pub enum ClusterStrategy {
    Dbscan(DbscanConfig),
    KMeans(KMeansConfig),
}

fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| ((x - y) * (x - y)) as f64)
        .sum::<f64>()
        .sqrt()
}

/// Label `-1` means noise (DBSCAN) or unreached (defensive default); all
/// other labels are cluster indices starting at 0.
pub fn dbscan(points: &[(String, Vec<f32>)], config: &DbscanConfig) -> HashMap<String, i32> {
    let n = points.len();
    let mut labels = vec![-1i32; n];
    let mut visited = vec![false; n];
    let mut next_cluster = 0i32;

    let neighbors = |i: usize| -> Vec<usize> {
        (0..n)
            .filter(|&j| j != i && euclidean(&points[i].1, &points[j].1) <= config.epsilon)
            .collect()
    };

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let mut seed_set = neighbors(i);
        if seed_set.len() + 1 < config.min_cluster_size {
            continue; // stays noise (-1)
        }
        labels[i] = next_cluster;
        let mut idx = 0;
        while idx < seed_set.len() {
            let j = seed_set[idx];
            if !visited[j] {
                visited[j] = true;
                let j_neighbors = neighbors(j);
                if j_neighbors.len() + 1 >= config.min_cluster_size {
                    for n in j_neighbors {
                        if !seed_set.contains(&n) {
                            seed_set.push(n);
                        }
                    }
                }
            }
            if labels[j] == -1 {
                labels[j] = next_cluster;
            }
            idx += 1;
        }
        next_cluster += 1;
    }

    points
        .iter()
        .enumerate()
        .map(|(i, (id, _))| (id.clone(), labels[i]))
        .collect()
}

/// Deterministic k-means: initial centroids are the first `num_clusters`
/// distinct points in input order, so the same input always produces the
/// same clustering without needing a seeded RNG.
pub fn kmeans(points: &[(String, Vec<f32>)], config: &KMeansConfig) -> HashMap<String, i32> {
    if points.is_empty() || config.num_clusters == 0 {
        return HashMap::new();
    }
    let k = config.num_clusters.min(points.len());
    let dim = points[0].1.len();
    let mut centroids: Vec<Vec<f32>> = points.iter().take(k).map(|(_, v)| v.clone()).collect();
    let mut assignment = vec![0usize; points.len()];

    for _ in 0..config.max_iterations.max(1) {
        let mut changed = false;
        for (i, (_, v)) in points.iter().enumerate() {
            let mut best = 0usize;
            let mut best_dist = f64::MAX;
            for (c, centroid) in centroids.iter().enumerate() {
                let d = euclidean(v, centroid);
                if d < best_dist {
                    best_dist = d;
                    best = c;
                }
            }
            if assignment[i] != best {
                assignment[i] = best;
                changed = true;
            }
        }

        let mut sums = vec![vec![0f32; dim]; k];
        let mut counts = vec![0usize; k];
        for (i, (_, v)) in points.iter().enumerate() {
            let c = assignment[i];
            counts[c] += 1;
            for d in 0..dim {
                sums[c][d] += v[d];
            }
        }
        for c in 0..k {
            if counts[c] > 0 {
                for d in 0..dim {
                    centroids[c][d] = sums[c][d] / counts[c] as f32;
                }
            }
        }

        if !changed {
            break;
        }
    }

    points
        .iter()
        .enumerate()
        .map(|(i, (id, _))| (id.clone(), assignment[i] as i32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dbscan_groups_close_points() {
        let points = vec![
            ("a".to_string(), vec![0.0, 0.0]),
            ("b".to_string(), vec![0.1, 0.0]),
            ("c".to_string(), vec![10.0, 10.0]),
        ];
        let labels = dbscan(
            &points,
            &DbscanConfig {
                epsilon: 0.5,
                min_cluster_size: 2,
            },
        );
        assert_eq!(labels["a"], labels["b"]);
        assert_eq!(labels["c"], -1);
    }

    #[test]
    fn kmeans_separates_two_groups() {
        let points = vec![
            ("a".to_string(), vec![0.0, 0.0]),
            ("b".to_string(), vec![0.1, 0.0]),
            ("c".to_string(), vec![10.0, 10.0]),
            ("d".to_string(), vec![10.1, 10.0]),
        ];
        let labels = kmeans(
            &points,
            &KMeansConfig {
                num_clusters: 2,
                max_iterations: 10,
            },
        );
        assert_eq!(labels["a"], labels["b"]);
        assert_eq!(labels["c"], labels["d"]);
        assert_ne!(labels["a"], labels["c"]);
    }
}
