use std::collections::BTreeSet;

use crate::element::ElementType;

/// Query filter for `ElementStore::list`: filters by type, active state,
/// and tags, all combined with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub element_type: Option<ElementType>,
    pub active: Option<bool>,
    pub tags: BTreeSet<String>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl ListFilter {
    pub fn matches(&self, elem: &crate::element::Element) -> bool {
        if let Some(t) = self.element_type {
            if elem.element_type != t {
                return false;
            }
        }
        if let Some(active) = self.active {
            if elem.active != active {
                return false;
            }
        }
        self.tags.iter().all(|tag| elem.tags.contains(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementBody};
    use chrono::Utc;

    fn elem(tags: &[&str], active: bool) -> Element {
        Element {
            id: "e".into(),
            element_type: ElementType::Skill,
            name: "n".into(),
            description: String::new(),
            version: "1.0.0".into(),
            author: "a".into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            active,
            body: ElementBody::Skill {
                procedures: vec![],
                extra: serde_json::Value::Null,
            },
        }
    }

    #[test]
    fn tags_are_and_semantics() {
        let filter = ListFilter {
            tags: BTreeSet::from(["a".to_string(), "b".to_string()]),
            ..Default::default()
        };
        assert!(filter.matches(&elem(&["a", "b", "c"], true)));
        assert!(!filter.matches(&elem(&["a"], true)));
    }

    #[test]
    fn active_filter_excludes_inactive() {
        let filter = ListFilter {
            active: Some(true),
            ..Default::default()
        };
        assert!(!filter.matches(&elem(&[], false)));
    }
}
