use std::collections::HashMap;

use roaring::RoaringBitmap;

/// Minimum token length kept in the inverted index; shorter runs (articles,
/// single letters) add noise without adding recall.
const MIN_TOKEN_LEN: usize = 3;

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TOKEN_LEN)
        .map(|w| w.to_lowercase())
        .collect()
}

/// Full-text inverted index over element ids, backed by `RoaringBitmap`
/// postings lists over a dense internal u32 id space ("an
/// inverted index mapping normalized tokens to the set of element ids
/// containing them"). This only supports the store's coarse keyword filter;
/// ranked lexical search lives in the sibling lexical-index crate.
#[derive(Default)]
pub struct InvertedIndex {
    postings: HashMap<String, RoaringBitmap>,
    id_to_u32: HashMap<String, u32>,
    u32_to_id: HashMap<u32, String>,
    next_id: u32,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, id: &str) -> u32 {
        if let Some(&n) = self.id_to_u32.get(id) {
            return n;
        }
        let n = self.next_id;
        self.next_id += 1;
        self.id_to_u32.insert(id.to_string(), n);
        self.u32_to_id.insert(n, id.to_string());
        n
    }

    pub fn add(&mut self, id: &str, text: &str) {
        let n = self.intern(id);
        for token in tokenize(text) {
            self.postings.entry(token).or_default().insert(n);
        }
    }

    pub fn remove(&mut self, id: &str) {
        let Some(n) = self.id_to_u32.remove(id) else {
            return;
        };
        self.u32_to_id.remove(&n);
        for bitmap in self.postings.values_mut() {
            bitmap.remove(n);
        }
        self.postings.retain(|_, bitmap| !bitmap.is_empty());
    }

    pub fn update(&mut self, id: &str, text: &str) {
        self.remove(id);
        self.add(id, text);
    }

    /// Ids matching any token in `query`, ordered by descending per-doc
    /// match count across tokens; ties broken by id for a stable order.
    pub fn search(&self, query: &str) -> Vec<String> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut counts: HashMap<u32, u32> = HashMap::new();
        for token in &tokens {
            if let Some(bitmap) = self.postings.get(token) {
                for n in bitmap.iter() {
                    *counts.entry(n).or_insert(0) += 1;
                }
            }
        }

        let mut hits: Vec<(u32, u32)> = counts.into_iter().collect();
        hits.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        hits.into_iter()
            .filter_map(|(n, _)| self.u32_to_id.get(&n).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_ranks_by_match_count_not_strict_and() {
        let mut idx = InvertedIndex::new();
        idx.add("a", "rust systems programming");
        idx.add("b", "rust web framework");
        idx.add("c", "python scripting");

        let hits = idx.search("rust framework");
        assert_eq!(hits, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn remove_drops_postings() {
        let mut idx = InvertedIndex::new();
        idx.add("a", "rust systems");
        idx.remove("a");
        assert!(idx.search("rust").is_empty());
    }

    #[test]
    fn short_tokens_are_ignored() {
        let mut idx = InvertedIndex::new();
        idx.add("a", "a an if rust");
        assert!(idx.search("if").is_empty());
        assert_eq!(idx.search("rust"), vec!["a".to_string()]);
    }
}
