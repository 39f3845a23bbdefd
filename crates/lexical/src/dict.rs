use std::collections::BTreeMap;

use fst::{Map, MapBuilder};

use crate::error::{LexicalError, LexicalResult};

/// Term → dense id dictionary. Interning happens against a plain
/// `BTreeMap` so adds stay O(log n); `rebuild` compacts the current
/// vocabulary into an `fst::Map` for memory-efficient ordered lookups.
#[derive(Default)]
pub struct TermDictionary {
    terms: BTreeMap<String, u32>,
    next_id: u32,
    built: Option<Map<Vec<u8>>>,
    dirty: bool,
}

impl TermDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, term: &str) -> u32 {
        if let Some(&id) = self.terms.get(term) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.terms.insert(term.to_string(), id);
        self.dirty = true;
        id
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn rebuild(&mut self) -> LexicalResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let mut builder = MapBuilder::memory();
        for (term, id) in &self.terms {
            builder
                .insert(term, *id as u64)
                .map_err(|e| LexicalError::Dictionary(e.to_string()))?;
        }
        let bytes = builder
            .into_inner()
            .map_err(|e| LexicalError::Dictionary(e.to_string()))?;
        self.built = Some(Map::new(bytes).map_err(|e| LexicalError::Dictionary(e.to_string()))?);
        self.dirty = false;
        Ok(())
    }

    pub fn lookup_compact(&self, term: &str) -> Option<u64> {
        self.built.as_ref().and_then(|m| m.get(term))
    }
}
