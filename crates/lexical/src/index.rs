use std::collections::HashMap;

use serde::Serialize;

use crate::dict::TermDictionary;
use crate::error::{LexicalError, LexicalResult};
use crate::tokenize::tokenize;

const MAX_HIGHLIGHTS: usize = 3;
const SNIPPET_RADIUS: usize = 40;

struct DocEntry {
    text: String,
    term_counts: HashMap<u32, u32>,
    max_count: u32,
    seq: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredHit {
    pub id: String,
    pub score: f64,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LexicalStats {
    pub document_count: usize,
    pub vocabulary_size: usize,
}

/// TF-IDF index over catalog element text.
///
/// IDF is recomputed lazily on the next read (`search`/`find_similar`) after
/// any `add`/`remove`, never eagerly inside the mutator — this satisfies
/// "implementations may batch rebuilds but must guarantee a rebuilt IDF is
/// visible before the next search returns" without paying the O(vocabulary)
/// cost on every single mutation in a bulk-load loop.
pub struct TfidfIndex {
    documents: HashMap<String, DocEntry>,
    df: HashMap<u32, usize>,
    idf: HashMap<u32, f64>,
    dict: TermDictionary,
    dirty: bool,
    next_seq: u64,
}

impl Default for TfidfIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TfidfIndex {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            df: HashMap::new(),
            idf: HashMap::new(),
            dict: TermDictionary::new(),
            dirty: false,
            next_seq: 0,
        }
    }

    pub fn add(&mut self, id: &str, text: &str) -> LexicalResult<()> {
        if self.documents.contains_key(id) {
            return Err(LexicalError::AlreadyExists(id.to_string()));
        }
        let tokens = tokenize(text);
        let mut term_counts: HashMap<u32, u32> = HashMap::new();
        for token in &tokens {
            let term_id = self.dict.intern(token);
            *term_counts.entry(term_id).or_insert(0) += 1;
        }
        let max_count = term_counts.values().copied().max().unwrap_or(0);

        for term_id in term_counts.keys() {
            *self.df.entry(*term_id).or_insert(0) += 1;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.documents.insert(
            id.to_string(),
            DocEntry {
                text: text.to_string(),
                term_counts,
                max_count,
                seq,
            },
        );
        self.dirty = true;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> LexicalResult<()> {
        let entry = self
            .documents
            .remove(id)
            .ok_or_else(|| LexicalError::NotFound(id.to_string()))?;
        for term_id in entry.term_counts.keys() {
            if let Some(count) = self.df.get_mut(term_id) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.df.remove(term_id);
                }
            }
        }
        self.dirty = true;
        Ok(())
    }

    fn ensure_fresh(&mut self) {
        if !self.dirty {
            return;
        }
        let n = self.documents.len() as f64;
        self.idf.clear();
        if n > 0.0 {
            for (&term_id, &df) in &self.df {
                self.idf.insert(term_id, (n / df as f64).ln());
            }
        }
        // Dictionary is kept compacted alongside the IDF rebuild so query-side
        // term lookups (`term_id_for`) resolve against the fst, not the
        // mutable BTreeMap used during ingestion.
        let _ = self.dict.rebuild();
        self.dirty = false;
    }

    /// Resolves a query token to its dense term id via the compacted `fst`
    /// dictionary. A token never seen during ingestion has no id and
    /// therefore cannot match any document.
    fn term_id_for(&self, token: &str) -> Option<u32> {
        self.dict.lookup_compact(token).map(|id| id as u32)
    }

    fn tfidf_vector(&self, term_counts: &HashMap<u32, u32>, max_count: u32) -> HashMap<u32, f64> {
        if max_count == 0 {
            return HashMap::new();
        }
        term_counts
            .iter()
            .filter_map(|(&term_id, &count)| {
                let idf = *self.idf.get(&term_id)?;
                let tf = count as f64 / max_count as f64;
                Some((term_id, tf * idf))
            })
            .collect()
    }

    fn cosine(a: &HashMap<u32, f64>, b: &HashMap<u32, f64>) -> f64 {
        let (smaller, larger) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        let numerator: f64 = smaller
            .iter()
            .filter_map(|(term, &va)| larger.get(term).map(|&vb| va * vb))
            .sum();
        let norm_a: f64 = a.values().map(|v| v * v).sum::<f64>().sqrt();
        let norm_b: f64 = b.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        numerator / (norm_a * norm_b)
    }

    fn highlights(text: &str, query_tokens: &[String]) -> Vec<String> {
        let lower = text.to_lowercase();
        let mut snippets = Vec::new();
        let mut search_from = 0usize;
        while snippets.len() < MAX_HIGHLIGHTS && search_from < lower.len() {
            let Some(rel_pos) = query_tokens
                .iter()
                .filter_map(|t| lower[search_from..].find(t.as_str()))
                .min()
            else {
                break;
            };
            let pos = search_from + rel_pos;
            let start = lower[..pos]
                .char_indices()
                .rev()
                .take(SNIPPET_RADIUS)
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            let end = lower[pos..]
                .char_indices()
                .take(SNIPPET_RADIUS)
                .last()
                .map(|(i, c)| pos + i + c.len_utf8())
                .unwrap_or(lower.len());
            snippets.push(text[start..end].trim().to_string());
            search_from = end.max(pos + 1);
        }
        snippets
    }

    /// Ranked search: cosine similarity over the tf·idf space, descending
    /// score, ties broken by insertion order. Empty query or empty index
    /// returns an empty result.
    pub fn search(&mut self, query: &str, limit: usize) -> Vec<ScoredHit> {
        if self.documents.is_empty() {
            return Vec::new();
        }
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }
        self.ensure_fresh();

        let mut query_counts: HashMap<u32, u32> = HashMap::new();
        for token in &query_tokens {
            if let Some(term_id) = self.term_id_for(token) {
                *query_counts.entry(term_id).or_insert(0) += 1;
            }
        }
        let query_max = query_counts.values().copied().max().unwrap_or(0);
        let query_vec = self.tfidf_vector(&query_counts, query_max);

        let mut scored: Vec<(String, f64, u64)> = self
            .documents
            .iter()
            .map(|(id, entry)| {
                let doc_vec = self.tfidf_vector(&entry.term_counts, entry.max_count);
                let score = Self::cosine(&query_vec, &doc_vec);
                (id.clone(), score, entry.seq)
            })
            .filter(|(_, score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.2.cmp(&b.2))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(id, score, _)| {
                let highlights = self
                    .documents
                    .get(&id)
                    .map(|entry| Self::highlights(&entry.text, &query_tokens))
                    .unwrap_or_default();
                ScoredHit {
                    id,
                    score,
                    highlights,
                }
            })
            .collect()
    }

    /// Documents most similar to `id`'s own tf·idf vector, excluding `id`.
    pub fn find_similar(&mut self, id: &str, limit: usize) -> LexicalResult<Vec<ScoredHit>> {
        if !self.documents.contains_key(id) {
            return Err(LexicalError::NotFound(id.to_string()));
        }
        self.ensure_fresh();

        let target = self.documents.get(id).unwrap();
        let target_vec = self.tfidf_vector(&target.term_counts, target.max_count);

        let mut scored: Vec<(String, f64, u64)> = self
            .documents
            .iter()
            .filter(|(other_id, _)| other_id.as_str() != id)
            .map(|(other_id, entry)| {
                let other_vec = self.tfidf_vector(&entry.term_counts, entry.max_count);
                let score = Self::cosine(&target_vec, &other_vec);
                (other_id.clone(), score, entry.seq)
            })
            .filter(|(_, score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.2.cmp(&b.2))
        });

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(id, score, _)| ScoredHit {
                id,
                score,
                highlights: Vec::new(),
            })
            .collect())
    }

    pub fn stats(&self) -> LexicalStats {
        LexicalStats {
            document_count: self.documents.len(),
            vocabulary_size: self.dict.len(),
        }
    }
}
