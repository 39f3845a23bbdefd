use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::atomic::atomic_write;
use crate::config::{StorageKind, StoreConfig};
use crate::element::Element;
use crate::error::{StoreError, StoreResult};
use crate::filter::ListFilter;
use crate::inverted::InvertedIndex;
use crate::lru::LruCache;
use crate::privacy::{ConfiguredPrivacyPolicy, PrivacyPolicy};

/// Storage, cache, and search surface for catalog elements.
///
/// Implementations must uphold: ids are unique within a store, `create`
/// rejects a duplicate id, `update`/`delete` on an unknown id return
/// `StoreError::NotFound`, and every mutation is durable before the call
/// returns (no write-behind).
pub trait ElementStore: Send + Sync {
    fn create(&self, element: Element) -> StoreResult<Element>;
    fn get(&self, id: &str) -> StoreResult<Element>;
    fn update(&self, element: Element) -> StoreResult<Element>;
    fn delete(&self, id: &str) -> StoreResult<()>;
    fn list(&self, filter: &ListFilter) -> StoreResult<Vec<Element>>;
    fn search(&self, query: &str, filter: &ListFilter) -> StoreResult<Vec<Element>>;
    fn exists(&self, id: &str) -> bool;
    fn backup(&self, dest: &Path) -> StoreResult<()>;
    fn restore(&self, src: &Path) -> StoreResult<()>;
}

struct StoreState {
    index: HashMap<String, Element>,
    lru: LruCache,
    inverted: InvertedIndex,
}

impl StoreState {
    fn new(lru_capacity: usize) -> Self {
        Self {
            index: HashMap::new(),
            lru: LruCache::new(lru_capacity),
            inverted: InvertedIndex::new(),
        }
    }

    fn insert(&mut self, element: Element) {
        self.inverted.update(&element.id, &element.searchable_text());
        self.lru.put(element.id.clone(), element.clone());
        self.index.insert(element.id.clone(), element);
    }

    fn remove(&mut self, id: &str) {
        self.inverted.remove(id);
        self.lru.remove(id);
        self.index.remove(id);
    }
}

fn relative_record_path(elem: &Element, policy: &dyn PrivacyPolicy) -> PathBuf {
    let author_segment = if elem.author.trim().is_empty() {
        PathBuf::from("default")
    } else if policy.is_private(&elem.author) {
        PathBuf::from("private").join(&elem.author)
    } else {
        PathBuf::from(&elem.author)
    };
    let date = elem.created_at.format("%Y-%m-%d").to_string();
    author_segment
        .join(elem.element_type.as_str())
        .join(date)
        .join(format!("{}.toml", elem.id))
}

/// Disk-backed element store. Layout is
/// `<root>/<author-or-default>/<type>/<YYYY-MM-DD>/<id>.toml`; a private
/// author `name` is namespaced under `<root>/private/<name>/...` so the
/// whole subtree can be gated with a single path check instead of
/// per-record ACL lookups.
pub struct FileElementStore {
    root: PathBuf,
    privacy: Box<dyn PrivacyPolicy>,
    state: RwLock<StoreState>,
}

impl FileElementStore {
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        assert_eq!(config.kind, StorageKind::File);
        let root = config.resolve_data_root();
        std::fs::create_dir_all(&root)?;
        let privacy = ConfiguredPrivacyPolicy::new(config.private_authors.iter().cloned());

        let mut state = StoreState::new(config.lru_capacity);
        Self::walk_and_load(&root, &mut state);

        Ok(Self {
            root,
            privacy: Box::new(privacy),
            state: RwLock::new(state),
        })
    }

    fn walk_and_load(root: &Path, state: &mut StoreState) {
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(e) => e,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "skipping unreadable directory during store load");
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                    continue;
                }
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<Element>(&contents) {
                        Ok(elem) => state.insert(elem),
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "skipping corrupt element record");
                        }
                    },
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable element record");
                    }
                }
            }
        }
    }

    fn record_path(&self, elem: &Element) -> PathBuf {
        self.root.join(relative_record_path(elem, self.privacy.as_ref()))
    }

    fn persist(&self, elem: &Element) -> StoreResult<()> {
        let body = toml::to_string_pretty(elem)
            .map_err(|e| StoreError::InvalidArgument(format!("cannot serialize element: {e}")))?;
        atomic_write(&self.record_path(elem), body.as_bytes())
    }
}

impl ElementStore for FileElementStore {
    fn create(&self, mut element: Element) -> StoreResult<Element> {
        let mut state = self.state.write().unwrap();
        if state.index.contains_key(&element.id) {
            return Err(StoreError::AlreadyExists(element.id));
        }
        let now = Utc::now();
        element.created_at = now;
        element.updated_at = now;
        self.persist(&element)?;
        state.insert(element.clone());
        Ok(element)
    }

    fn get(&self, id: &str) -> StoreResult<Element> {
        {
            let state = self.state.read().unwrap();
            if let Some(elem) = state.lru.peek(id) {
                return Ok(elem.clone());
            }
            if state.index.get(id).is_none() {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }
        let mut state = self.state.write().unwrap();
        let elem = state
            .index
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        state.lru.put(id.to_string(), elem.clone());
        Ok(elem)
    }

    fn update(&self, mut element: Element) -> StoreResult<Element> {
        let mut state = self.state.write().unwrap();
        let existing = state
            .index
            .get(&element.id)
            .ok_or_else(|| StoreError::NotFound(element.id.clone()))?;
        element.created_at = existing.created_at;
        element.updated_at = Utc::now();

        if relative_record_path(&element, self.privacy.as_ref())
            != relative_record_path(existing, self.privacy.as_ref())
        {
            let old_path = self.record_path(existing);
            let _ = std::fs::remove_file(old_path);
        }
        self.persist(&element)?;
        state.insert(element.clone());
        Ok(element)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().unwrap();
        let elem = state
            .index
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        std::fs::remove_file(self.record_path(&elem))?;
        state.remove(id);
        Ok(())
    }

    fn list(&self, filter: &ListFilter) -> StoreResult<Vec<Element>> {
        let state = self.state.read().unwrap();
        let mut matched: Vec<Element> = state
            .index
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.id.cmp(&b.id));
        let matched = matched.into_iter().skip(filter.offset);
        Ok(match filter.limit {
            Some(limit) => matched.take(limit).collect(),
            None => matched.collect(),
        })
    }

    fn search(&self, query: &str, filter: &ListFilter) -> StoreResult<Vec<Element>> {
        let state = self.state.read().unwrap();
        let matched = state
            .inverted
            .search(query)
            .into_iter()
            .filter_map(|id| state.index.get(&id).cloned())
            .filter(|e| filter.matches(e));
        let matched = matched.skip(filter.offset);
        Ok(match filter.limit {
            Some(limit) => matched.take(limit).collect(),
            None => matched.collect(),
        })
    }

    fn exists(&self, id: &str) -> bool {
        self.state.read().unwrap().index.contains_key(id)
    }

    fn backup(&self, dest: &Path) -> StoreResult<()> {
        std::fs::create_dir_all(dest)?;
        let mut manifest = String::new();
        let state = self.state.read().unwrap();
        for elem in state.index.values() {
            let rel = relative_record_path(elem, self.privacy.as_ref());
            let dest_path = dest.join(&rel);
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let body = toml::to_string_pretty(elem)
                .map_err(|e| StoreError::InvalidArgument(format!("cannot serialize element: {e}")))?;
            std::fs::write(&dest_path, body.as_bytes())?;
            let digest = Sha256::digest(body.as_bytes());
            manifest.push_str(&format!("{:x}  {}\n", digest, rel.display()));
        }
        std::fs::write(dest.join("MANIFEST.sha256"), manifest)?;
        Ok(())
    }

    fn restore(&self, src: &Path) -> StoreResult<()> {
        let mut state = self.state.write().unwrap();
        *state = StoreState::new(state.lru.len().max(100));
        Self::walk_and_load(src, &mut state);
        for elem in state.index.values() {
            self.persist(elem)?;
        }
        Ok(())
    }
}

/// Pure in-memory store, no disk I/O. Useful for tests and for the
/// `memory` `StorageKind` when a caller wants catalog semantics without
/// file-system durability.
pub struct InMemoryElementStore {
    state: RwLock<StoreState>,
}

impl InMemoryElementStore {
    pub fn new(lru_capacity: usize) -> Self {
        Self {
            state: RwLock::new(StoreState::new(lru_capacity)),
        }
    }
}

impl Default for InMemoryElementStore {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ElementStore for InMemoryElementStore {
    fn create(&self, mut element: Element) -> StoreResult<Element> {
        let mut state = self.state.write().unwrap();
        if state.index.contains_key(&element.id) {
            return Err(StoreError::AlreadyExists(element.id));
        }
        let now = Utc::now();
        element.created_at = now;
        element.updated_at = now;
        state.insert(element.clone());
        Ok(element)
    }

    fn get(&self, id: &str) -> StoreResult<Element> {
        {
            let state = self.state.read().unwrap();
            if let Some(elem) = state.lru.peek(id) {
                return Ok(elem.clone());
            }
            if state.index.get(id).is_none() {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }
        let mut state = self.state.write().unwrap();
        let elem = state
            .index
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        state.lru.put(id.to_string(), elem.clone());
        Ok(elem)
    }

    fn update(&self, mut element: Element) -> StoreResult<Element> {
        let mut state = self.state.write().unwrap();
        let existing = state
            .index
            .get(&element.id)
            .ok_or_else(|| StoreError::NotFound(element.id.clone()))?;
        element.created_at = existing.created_at;
        element.updated_at = Utc::now();
        state.insert(element.clone());
        Ok(element)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().unwrap();
        if !state.index.contains_key(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        state.remove(id);
        Ok(())
    }

    fn list(&self, filter: &ListFilter) -> StoreResult<Vec<Element>> {
        let state = self.state.read().unwrap();
        let mut matched: Vec<Element> = state
            .index
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.id.cmp(&b.id));
        let matched = matched.into_iter().skip(filter.offset);
        Ok(match filter.limit {
            Some(limit) => matched.take(limit).collect(),
            None => matched.collect(),
        })
    }

    fn search(&self, query: &str, filter: &ListFilter) -> StoreResult<Vec<Element>> {
        let state = self.state.read().unwrap();
        let matched = state
            .inverted
            .search(query)
            .into_iter()
            .filter_map(|id| state.index.get(&id).cloned())
            .filter(|e| filter.matches(e));
        let matched = matched.skip(filter.offset);
        Ok(match filter.limit {
            Some(limit) => matched.take(limit).collect(),
            None => matched.collect(),
        })
    }

    fn exists(&self, id: &str) -> bool {
        self.state.read().unwrap().index.contains_key(id)
    }

    fn backup(&self, _dest: &Path) -> StoreResult<()> {
        Err(StoreError::InvalidArgument(
            "in-memory store does not support backup".into(),
        ))
    }

    fn restore(&self, _src: &Path) -> StoreResult<()> {
        Err(StoreError::InvalidArgument(
            "in-memory store does not support restore".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementBody, ElementType};
    use std::collections::BTreeSet;

    fn new_elem(id: &str, author: &str) -> Element {
        Element {
            id: id.into(),
            element_type: ElementType::Memory,
            name: "n".into(),
            description: "d".into(),
            version: "1.0.0".into(),
            author: author.into(),
            tags: BTreeSet::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            active: true,
            body: ElementBody::Memory {
                content: "hello rust world".into(),
                extra: serde_json::Value::Null,
            },
        }
    }

    #[test]
    fn create_then_get_roundtrips_in_memory() {
        let store = InMemoryElementStore::default();
        let elem = new_elem("a", "alice");
        store.create(elem.clone()).unwrap();
        let fetched = store.get("a").unwrap();
        assert_eq!(fetched.id, "a");
    }

    #[test]
    fn duplicate_create_rejected() {
        let store = InMemoryElementStore::default();
        store.create(new_elem("a", "alice")).unwrap();
        let err = store.create(new_elem("a", "alice")).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig {
            kind: StorageKind::File,
            data_root: dir.path().to_string_lossy().to_string(),
            lru_capacity: 10,
            private_authors: Vec::new(),
        };
        {
            let store = FileElementStore::open(&cfg).unwrap();
            store.create(new_elem("a", "alice")).unwrap();
        }
        let reopened = FileElementStore::open(&cfg).unwrap();
        assert!(reopened.exists("a"));
    }

    #[test]
    fn file_store_skips_corrupt_record_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig {
            kind: StorageKind::File,
            data_root: dir.path().to_string_lossy().to_string(),
            lru_capacity: 10,
            private_authors: Vec::new(),
        };
        let store = FileElementStore::open(&cfg).unwrap();
        store.create(new_elem("good", "alice")).unwrap();
        let bad_path = dir.path().join("alice/memory/2020-01-01/bad.toml");
        std::fs::create_dir_all(bad_path.parent().unwrap()).unwrap();
        std::fs::write(&bad_path, b"not valid toml ===").unwrap();

        let reopened = FileElementStore::open(&cfg).unwrap();
        assert!(reopened.exists("good"));
        assert!(!reopened.exists("bad"));
    }

    #[test]
    fn search_finds_by_body_text() {
        let store = InMemoryElementStore::default();
        store.create(new_elem("a", "alice")).unwrap();
        let hits = store.search("rust", &ListFilter::default()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn search_applies_filter_and_pagination() {
        let store = InMemoryElementStore::default();
        store.create(new_elem("a", "alice")).unwrap();
        store.create(new_elem("b", "alice")).unwrap();
        store.create(new_elem("c", "alice")).unwrap();
        let filter = ListFilter {
            limit: Some(1),
            ..Default::default()
        };
        let hits = store.search("rust", &filter).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn private_author_is_namespaced_under_private() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig {
            kind: StorageKind::File,
            data_root: dir.path().to_string_lossy().to_string(),
            lru_capacity: 10,
            private_authors: vec!["alice".to_string()],
        };
        let store = FileElementStore::open(&cfg).unwrap();
        let created = store.create(new_elem("a", "alice")).unwrap();
        let date = created.created_at.format("%Y-%m-%d").to_string();
        let expected = dir
            .path()
            .join("private")
            .join("alice")
            .join("memory")
            .join(date)
            .join("a.toml");
        assert!(expected.exists());
    }
}
