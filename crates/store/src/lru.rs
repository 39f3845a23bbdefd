use std::collections::HashMap;

use crate::element::Element;

const NONE: usize = usize::MAX;

struct Node {
    key: String,
    value: Element,
    prev: usize,
    next: usize,
}

/// Bounded LRU cache with intrusive doubly-linked recency order. Nodes live
/// in a flat arena (`slots`) so the list links are plain indices rather
/// than pointers/`Rc`s, which keeps the whole cache `Send` without
/// interior-mutability gymnastics.
///
/// Capacity 0 is normalized to the default of 100: a cache with no slots
/// is not a useful cache.
pub struct LruCache {
    capacity: usize,
    slots: Vec<Node>,
    free: Vec<usize>,
    index: HashMap<String, usize>,
    head: usize, // most recently used
    tail: usize, // least recently used
}

impl LruCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 { 100 } else { capacity };
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: HashMap::with_capacity(capacity),
            head: NONE,
            tail: NONE,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&mut self, key: &str) -> Option<Element> {
        let idx = *self.index.get(key)?;
        self.touch(idx);
        Some(self.slots[idx].value.clone())
    }

    pub fn peek(&self, key: &str) -> Option<&Element> {
        self.index.get(key).map(|&idx| &self.slots[idx].value)
    }

    /// Insert or refresh an entry, evicting the least-recently-used slot if
    /// at capacity. Invariant 3 (): the inserted value is a snapshot,
    /// so callers must pass a fresh clone on every admit.
    pub fn put(&mut self, key: String, value: Element) {
        if let Some(&idx) = self.index.get(&key) {
            self.slots[idx].value = value;
            self.touch(idx);
            return;
        }

        if self.index.len() >= self.capacity {
            self.evict_tail();
        }

        let idx = if let Some(free_idx) = self.free.pop() {
            self.slots[free_idx] = Node {
                key: key.clone(),
                value,
                prev: NONE,
                next: NONE,
            };
            free_idx
        } else {
            self.slots.push(Node {
                key: key.clone(),
                value,
                prev: NONE,
                next: NONE,
            });
            self.slots.len() - 1
        };

        self.index.insert(key, idx);
        self.push_front(idx);
    }

    pub fn remove(&mut self, key: &str) {
        if let Some(idx) = self.index.remove(key) {
            self.unlink(idx);
            self.free.push(idx);
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = NONE;
        self.tail = NONE;
    }

    fn evict_tail(&mut self) {
        if self.tail == NONE {
            return;
        }
        let key = self.slots[self.tail].key.clone();
        self.remove(&key);
    }

    fn touch(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        if prev != NONE {
            self.slots[prev].next = next;
        } else if self.head == idx {
            self.head = next;
        }
        if next != NONE {
            self.slots[next].prev = prev;
        } else if self.tail == idx {
            self.tail = prev;
        }
        self.slots[idx].prev = NONE;
        self.slots[idx].next = NONE;
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = NONE;
        self.slots[idx].next = self.head;
        if self.head != NONE {
            self.slots[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NONE {
            self.tail = idx;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementBody, ElementType};
    use std::collections::BTreeSet;

    fn elem(id: &str) -> Element {
        Element {
            id: id.into(),
            element_type: ElementType::Memory,
            name: id.into(),
            description: String::new(),
            version: "1.0.0".into(),
            author: "a".into(),
            tags: BTreeSet::new(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            active: true,
            body: ElementBody::Memory {
                content: String::new(),
                extra: serde_json::Value::Null,
            },
        }
    }

    #[test]
    fn cache_hit_then_delete_is_miss() {
        let mut cache = LruCache::new(10);
        cache.put("k1".into(), elem("k1"));
        assert!(cache.get("k1").is_some());
        cache.remove("k1");
        assert!(cache.get("k1").is_none());
    }

    #[test]
    fn eviction_drops_least_recently_used() {
        let mut cache = LruCache::new(2);
        cache.put("a".into(), elem("a"));
        cache.put("b".into(), elem("b"));
        // touch "a" so "b" becomes the LRU victim
        cache.get("a");
        cache.put("c".into(), elem("c"));

        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_normalizes_to_default() {
        let cache = LruCache::new(0);
        assert_eq!(cache.capacity, 100);
    }
}
