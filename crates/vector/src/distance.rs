use crate::config::DistanceMetric;

/// Returns a value where smaller means "closer", regardless of metric, so
/// callers (linear scan, HNSW search) never branch on which metric is in
/// play. Dot-product similarity is negated to fit that convention.
pub fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
        DistanceMetric::Euclidean => euclidean(a, b),
        DistanceMetric::DotProduct => -dot(a, b),
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot(a, a).sqrt();
    let norm_b = dot(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_cosine_distance() {
        let v = vec![1.0, 2.0, 3.0];
        let d = distance(DistanceMetric::Cosine, &v, &v);
        assert!(d.abs() < 1e-5);
    }

    #[test]
    fn orthogonal_vectors_have_unit_cosine_distance() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let d = distance(DistanceMetric::Cosine, &a, &b);
        assert!((d - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_vector_cosine_distance_is_bounded() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        let d = distance(DistanceMetric::Cosine, &a, &b);
        assert!((d - 1.0).abs() < 1e-5);
    }
}
