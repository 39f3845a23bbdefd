use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The six element kinds the catalog knows how to store and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Persona,
    Skill,
    Template,
    Agent,
    Memory,
    Ensemble,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Persona => "persona",
            ElementType::Skill => "skill",
            ElementType::Template => "template",
            ElementType::Agent => "agent",
            ElementType::Memory => "memory",
            ElementType::Ensemble => "ensemble",
        }
    }
}

/// Type-specific body. Every variant exposes the extra searchable text the
/// lexical index needs via [`ElementBody::searchable_text`], plus an
/// `extra` escape hatch so callers can carry fields this spec does not
/// enumerate without a schema migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementBody {
    Persona {
        system_prompt: String,
        #[serde(default)]
        extra: serde_json::Value,
    },
    Skill {
        procedures: Vec<String>,
        #[serde(default)]
        extra: serde_json::Value,
    },
    Template {
        body: String,
        #[serde(default)]
        extra: serde_json::Value,
    },
    Agent {
        system_prompt: String,
        #[serde(default)]
        triggers: Vec<String>,
        #[serde(default)]
        extra: serde_json::Value,
    },
    Memory {
        content: String,
        #[serde(default)]
        extra: serde_json::Value,
    },
    Ensemble {
        member_ids: Vec<String>,
        #[serde(default)]
        extra: serde_json::Value,
    },
}

impl ElementBody {
    pub fn searchable_text(&self) -> String {
        match self {
            ElementBody::Persona { system_prompt, .. } => system_prompt.clone(),
            ElementBody::Skill { procedures, .. } => procedures.join(" "),
            ElementBody::Template { body, .. } => body.clone(),
            ElementBody::Agent {
                system_prompt,
                triggers,
                ..
            } => format!("{system_prompt} {}", triggers.join(" ")),
            ElementBody::Memory { content, .. } => content.clone(),
            ElementBody::Ensemble { member_ids, .. } => member_ids.join(" "),
        }
    }
}

/// A uniquely identified catalog record.
///
/// `id` is opaque and globally unique within a single store. `tags` is a
/// set, not a list, so filter AND-semantics doesn't need to dedupe on
/// every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub element_type: ElementType,
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub active: bool,
    pub body: ElementBody,
}

fn default_true() -> bool {
    true
}

impl Element {
    /// Concatenated searchable text (name, description, tags, body text) as
    /// used by both the store's inverted index and the lexical index's
    /// document projection.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name,
            self.description,
            self.tags.iter().cloned().collect::<Vec<_>>().join(" "),
            self.body.searchable_text()
        )
    }

    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn searchable_text_combines_fields() {
        let elem = Element {
            id: "e1".into(),
            element_type: ElementType::Persona,
            name: "Helper".into(),
            description: "A helpful persona".into(),
            version: "1.0.0".into(),
            author: "alice".into(),
            tags: BTreeSet::from(["assistant".to_string()]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            active: true,
            body: ElementBody::Persona {
                system_prompt: "Be concise.".into(),
                extra: serde_json::Value::Null,
            },
        };
        let text = elem.searchable_text();
        assert!(text.contains("Helper"));
        assert!(text.contains("assistant"));
        assert!(text.contains("Be concise."));
    }
}
