use std::collections::HashSet;

use regex::Regex;

#[derive(Debug, Clone, Default)]
pub struct ExtractedGraph {
    pub entities: Vec<String>,
    pub urls: Vec<String>,
    pub emails: Vec<String>,
    pub keywords: Vec<String>,
    pub relationships: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KgConfig {
    pub max_keywords: usize,
    pub max_relationships: usize,
}

impl Default for KgConfig {
    fn default() -> Self {
        Self {
            max_keywords: 20,
            max_relationships: 50,
        }
    }
}

/// Pattern-based entity/URL/email/keyword extraction. No NLP
/// model involved: "entities" are capitalized multi-word runs, "keywords"
/// are the most frequent non-trivial lowercase tokens, and relationships
/// are co-occurrence pairs of entities within the same sentence.
pub struct KgExtractor {
    url_re: Regex,
    email_re: Regex,
    entity_re: Regex,
    word_re: Regex,
}

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "her", "was", "one", "our",
    "out", "day", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see", "two",
    "way", "who", "boy", "did", "its", "let", "put", "say", "she", "too", "use", "with", "this",
    "that", "from", "have", "will", "your",
];

impl KgExtractor {
    pub fn new() -> Self {
        Self {
            url_re: Regex::new(r"https?://[^\s)]+").unwrap(),
            email_re: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            entity_re: Regex::new(r"\b([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)\b").unwrap(),
            word_re: Regex::new(r"[a-zA-Z]{4,}").unwrap(),
        }
    }

    pub fn extract(&self, text: &str, config: &KgConfig) -> ExtractedGraph {
        let urls: Vec<String> = self.url_re.find_iter(text).map(|m| m.as_str().to_string()).collect();
        let emails: Vec<String> = self
            .email_re
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();

        let mut entities: Vec<String> = self
            .entity_re
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
        entities.sort();
        entities.dedup();

        let mut frequency: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
        for word in self.word_re.find_iter(text) {
            let lower = word.as_str().to_lowercase();
            if STOPWORDS.contains(&lower.as_str()) {
                continue;
            }
            *frequency.entry(lower).or_insert(0) += 1;
        }
        let mut keywords: Vec<(String, usize)> = frequency.into_iter().collect();
        keywords.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let keywords: Vec<String> = keywords
            .into_iter()
            .take(config.max_keywords)
            .map(|(k, _)| k)
            .collect();

        let mut relationships = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        for sentence in text.split(['.', '!', '?']) {
            let sentence_entities: Vec<&String> = entities
                .iter()
                .filter(|e| sentence.contains(e.as_str()))
                .collect();
            for i in 0..sentence_entities.len() {
                for j in (i + 1)..sentence_entities.len() {
                    let pair = (sentence_entities[i].clone(), sentence_entities[j].clone());
                    if seen.insert(pair.clone()) {
                        relationships.push(pair);
                        if relationships.len() >= config.max_relationships {
                            return ExtractedGraph {
                                entities,
                                urls,
                                emails,
                                keywords,
                                relationships,
                            };
                        }
                    }
                }
            }
        }

        ExtractedGraph {
            entities,
            urls,
            emails,
            keywords,
            relationships,
        }
    }
}

impl Default for KgExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_url_and_email() {
        let extractor = KgExtractor::new();
        let graph = extractor.extract(
            "Contact Alice Smith at alice@example.com or visit https://example.com/docs for details.",
            &KgConfig::default(),
        );
        assert_eq!(graph.emails, vec!["alice@example.com".to_string()]);
        assert_eq!(graph.urls, vec!["https://example.com/docs".to_string()]);
        assert!(graph.entities.iter().any(|e| e == "Alice Smith"));
    }

    #[test]
    fn relates_entities_in_same_sentence() {
        let extractor = KgExtractor::new();
        let graph = extractor.extract(
            "Alice Smith works with Bob Jones daily. They are unrelated to Carol Lee otherwise.",
            &KgConfig::default(),
        );
        assert!(graph
            .relationships
            .iter()
            .any(|(a, b)| (a == "Alice Smith" && b == "Bob Jones")));
    }
}
