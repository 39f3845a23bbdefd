use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    File,
    Memory,
}

impl Default for StorageKind {
    fn default() -> Self {
        StorageKind::File
    }
}

fn default_lru_capacity() -> usize {
    100
}

/// Store configuration as loaded from `CatalogConfig`. `data_root` is left
/// blank by default and resolved lazily: see [`StoreConfig::resolve`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StorageKind,
    #[serde(default)]
    pub data_root: String,
    #[serde(default = "default_lru_capacity")]
    pub lru_capacity: usize,
    /// Author names whose records are namespaced under `<root>/private/<name>/...`.
    #[serde(default)]
    pub private_authors: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::File,
            data_root: String::new(),
            lru_capacity: default_lru_capacity(),
            private_authors: Vec::new(),
        }
    }
}

impl StoreConfig {
    /// Resolves a possibly-blank `data_root` to a concrete directory.
    ///
    /// Open Question 1 resolution: an explicit `data_root` wins; otherwise
    /// fall back to `$CATALOG_DATA_ROOT`, then the platform data directory
    /// (`dirs::data_dir()/catalog`), then `./catalog-data` as a last resort
    /// when no platform data directory can be determined (e.g. a minimal
    /// container image with no `HOME`).
    pub fn resolve_data_root(&self) -> PathBuf {
        if !self.data_root.trim().is_empty() {
            return PathBuf::from(&self.data_root);
        }
        if let Ok(env_root) = std::env::var("CATALOG_DATA_ROOT") {
            if !env_root.trim().is_empty() {
                return PathBuf::from(env_root);
            }
        }
        if let Some(base) = dirs::data_dir() {
            return base.join("catalog");
        }
        PathBuf::from("./catalog-data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_wins() {
        let cfg = StoreConfig {
            data_root: "/tmp/explicit".into(),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_data_root(), PathBuf::from("/tmp/explicit"));
    }

    #[test]
    fn blank_root_falls_back_to_default_kind() {
        let cfg = StoreConfig::default();
        assert_eq!(cfg.kind, StorageKind::File);
        // Resolution always yields a non-empty path.
        assert!(!cfg.resolve_data_root().as_os_str().is_empty());
    }
}
