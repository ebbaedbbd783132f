//! JSON category statistics file

use crate::output::CategoryStats;
use crate::storage::atomic::write_atomic;
use crate::storage::traits::{CategoryStore, StorageResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Category statistics stored as one JSON object, replaced atomically on save
#[derive(Debug, Clone)]
pub struct JsonCategoryStore {
    path: PathBuf,
}

impl JsonCategoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CategoryStore for JsonCategoryStore {
    fn load(&self) -> CategoryStats {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return CategoryStats::new(),
            Err(e) => {
                tracing::error!(
                    "Failed to read category stats {}: {}. Starting with empty stats",
                    self.path.display(),
                    e
                );
                return CategoryStats::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(
                    "Category stats {} are corrupt ({}). Starting with empty stats",
                    self.path.display(),
                    e
                );
                CategoryStats::new()
            }
        }
    }

    fn save(&mut self, stats: &CategoryStats) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(stats)?;
        write_atomic(&self.path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_empty_stats() {
        let dir = tempdir().unwrap();
        let store = JsonCategoryStore::new(dir.path().join("stats.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let mut store = JsonCategoryStore::new(dir.path().join("stats.json"));

        let mut stats = CategoryStats::new();
        stats.record_observation("domaci", 42);
        stats.record_observation("domaci", 43);
        stats.record_observation("svet", 42);
        store.save(&stats).unwrap();

        assert_eq!(store.load(), stats);
    }

    #[test]
    fn test_corrupt_file_yields_empty_stats() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        std::fs::write(&path, "{\"domaci\": {\"count\": ").unwrap();

        assert!(JsonCategoryStore::new(&path).load().is_empty());
    }

    #[test]
    fn test_file_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let mut store = JsonCategoryStore::new(&path);

        let mut stats = CategoryStats::new();
        stats.record_observation("kultura", 7);
        store.save(&stats).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"kultura": {"count": 1, "associated_tags": [7]}})
        );
    }
}
