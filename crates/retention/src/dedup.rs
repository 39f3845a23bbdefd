/// A pair of elements whose embeddings are similar enough to be considered
/// duplicates, plus the similarity that triggered the match.
#[derive(Debug, Clone)]
pub struct DuplicatePair {
    pub a: String,
    pub b: String,
    pub similarity: f64,
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}

/// Finds every pair whose cosine similarity is at or above `threshold`.
/// `O(n^2)` — consolidation is an offline orchestration step, not part of
/// the retrieval hot path (), so the quadratic pass is acceptable
/// at catalog scale.
pub fn find_duplicates(items: &[(String, Vec<f32>)], threshold: f64) -> Vec<DuplicatePair> {
    let mut pairs = Vec::new();
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            let similarity = cosine(&items[i].1, &items[j].1);
            if similarity >= threshold {
                pairs.push(DuplicatePair {
                    a: items[i].0.clone(),
                    b: items[j].0.clone(),
                    similarity,
                });
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_are_flagged_duplicates() {
        let items = vec![
            ("a".to_string(), vec![1.0, 0.0]),
            ("b".to_string(), vec![1.0, 0.0]),
            ("c".to_string(), vec![0.0, 1.0]),
        ];
        let dupes = find_duplicates(&items, 0.95);
        assert_eq!(dupes.len(), 1);
        assert_eq!(dupes[0].a, "a");
        assert_eq!(dupes[0].b, "b");
    }
}
