use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub user: Option<String>,
    pub operation: Option<String>,
    pub tool: Option<String>,
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub min_level: Option<LogLevel>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub keyword: Option<String>,
    pub user: Option<String>,
    pub operation: Option<String>,
    pub tool: Option<String>,
    pub limit: Option<usize>,
}

impl LogFilter {
    fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(min) = self.min_level {
            if entry.level < min {
                return false;
            }
        }
        if let Some(after) = self.after {
            if entry.timestamp < after {
                return false;
            }
        }
        if let Some(before) = self.before {
            if entry.timestamp > before {
                return false;
            }
        }
        if let Some(user) = &self.user {
            if entry.user.as_deref() != Some(user.as_str()) {
                return false;
            }
        }
        if let Some(operation) = &self.operation {
            if entry.operation.as_deref() != Some(operation.as_str()) {
                return false;
            }
        }
        if let Some(tool) = &self.tool {
            if entry.tool.as_deref() != Some(tool.as_str()) {
                return false;
            }
        }
        if let Some(keyword) = &self.keyword {
            let keyword = keyword.to_lowercase();
            let in_message = entry.message.to_lowercase().contains(&keyword);
            let in_attrs = entry
                .attributes
                .values()
                .any(|v| v.to_lowercase().contains(&keyword));
            if !in_message && !in_attrs {
                return false;
            }
        }
        true
    }
}

/// Bounded ring buffer of log entries, adapted from a byte-oriented ring
/// buffer into one over structured entries: `add` overwrites the oldest
/// slot once at capacity, `query` scans newest-first under a shared read
/// lock so concurrent readers never block each other.
pub struct RingLogBuffer {
    capacity: usize,
    entries: RwLock<VecDeque<LogEntry>>,
}

impl RingLogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn add(&self, entry: LogEntry) {
        let mut entries = self.entries.write().unwrap();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn query(&self, filter: &LogFilter) -> Vec<LogEntry> {
        let entries = self.entries.read().unwrap();
        let matches = entries.iter().rev().filter(|e| filter.matches(e));
        match filter.limit {
            Some(limit) => matches.take(limit).cloned().collect(),
            None => matches.cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(msg: &str, level: LogLevel) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level,
            message: msg.to_string(),
            user: None,
            operation: None,
            tool: None,
            attributes: HashMap::new(),
        }
    }

    #[test]
    fn overwrites_oldest_at_capacity() {
        let buf = RingLogBuffer::new(3);
        for i in 0..5 {
            buf.add(entry(&format!("m{i}"), LogLevel::Info));
        }
        let all = buf.query(&LogFilter::default());
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].message, "m4");
        assert_eq!(all[2].message, "m2");
    }

    #[test]
    fn query_orders_newest_first() {
        let buf = RingLogBuffer::new(10);
        buf.add(entry("first", LogLevel::Info));
        buf.add(entry("second", LogLevel::Info));
        let all = buf.query(&LogFilter::default());
        assert_eq!(all[0].message, "second");
        assert_eq!(all[1].message, "first");
    }

    #[test]
    fn min_level_filters_below_floor() {
        let buf = RingLogBuffer::new(10);
        buf.add(entry("debug stuff", LogLevel::Debug));
        buf.add(entry("warning stuff", LogLevel::Warn));
        let hits = buf.query(&LogFilter {
            min_level: Some(LogLevel::Warn),
            ..Default::default()
        });
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].message, "warning stuff");
    }

    #[test]
    fn keyword_search_is_case_insensitive() {
        let buf = RingLogBuffer::new(10);
        buf.add(entry("Rust Is Great", LogLevel::Info));
        let hits = buf.query(&LogFilter {
            keyword: Some("rust".into()),
            ..Default::default()
        });
        assert_eq!(hits.len(), 1);
    }
}
