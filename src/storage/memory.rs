//! In-memory stores
//!
//! Handles are cheap clones sharing one backing value, so a caller can hand a
//! store to the coordinator and still inspect what was persisted.

use crate::output::CategoryStats;
use crate::state::CrawlState;
use crate::storage::traits::{CategoryStore, CheckpointStore, CorpusIndex, StorageResult};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Checkpoint store keeping every saved state in order
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    saved: Arc<Mutex<Vec<CrawlState>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose last saved state is `state`
    pub fn with_state(state: CrawlState) -> Self {
        Self {
            saved: Arc::new(Mutex::new(vec![state])),
        }
    }

    /// Every state passed to `save`, oldest first
    pub fn history(&self) -> Vec<CrawlState> {
        lock(&self.saved).clone()
    }

    pub fn current(&self) -> CrawlState {
        self.load()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> CrawlState {
        lock(&self.saved)
            .last()
            .cloned()
            .map(CrawlState::normalized)
            .unwrap_or_default()
    }

    fn save(&mut self, state: &CrawlState) -> StorageResult<()> {
        lock(&self.saved).push(state.clone());
        Ok(())
    }
}

/// Corpus index that also remembers append order
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpusIndex {
    inner: Arc<Mutex<(HashSet<String>, Vec<String>)>>,
}

impl MemoryCorpusIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identifiers<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut corpus = Self::new();
        for identifier in identifiers {
            let identifier = identifier.into();
            let _ = corpus.append(&identifier);
        }
        corpus
    }

    /// Identifiers in the order they were appended
    pub fn lines(&self) -> Vec<String> {
        lock(&self.inner).1.clone()
    }
}

impl CorpusIndex for MemoryCorpusIndex {
    fn contains(&self, identifier: &str) -> bool {
        lock(&self.inner).0.contains(identifier)
    }

    fn append(&mut self, identifier: &str) -> StorageResult<bool> {
        let mut inner = lock(&self.inner);
        if !inner.0.insert(identifier.to_string()) {
            return Ok(false);
        }
        inner.1.push(identifier.to_string());
        Ok(true)
    }

    fn len(&self) -> usize {
        lock(&self.inner).0.len()
    }
}

/// Category store holding the last saved statistics
#[derive(Debug, Clone, Default)]
pub struct MemoryCategoryStore {
    stats: Arc<Mutex<CategoryStats>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(stats: CategoryStats) -> Self {
        Self {
            stats: Arc::new(Mutex::new(stats)),
            saves: Arc::default(),
        }
    }

    /// Number of times `save` was called
    pub fn save_count(&self) -> usize {
        *lock(&self.saves)
    }
}

impl CategoryStore for MemoryCategoryStore {
    fn load(&self) -> CategoryStats {
        lock(&self.stats).clone()
    }

    fn save(&mut self, stats: &CategoryStats) -> StorageResult<()> {
        *lock(&self.stats) = stats.clone();
        *lock(&self.saves) += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_history() {
        let mut store = MemoryCheckpointStore::new();
        assert_eq!(store.load(), CrawlState::new());

        let mut state = CrawlState::new();
        state.record_page(3, 1);
        store.save(&state).unwrap();

        let clone = store.clone();
        assert_eq!(clone.history().len(), 1);
        assert_eq!(clone.current().current_key, Some(3));
    }

    #[test]
    fn test_corpus_dedup() {
        let mut corpus = MemoryCorpusIndex::with_identifiers(["a"]);
        assert!(!corpus.append("a").unwrap());
        assert!(corpus.append("b").unwrap());
        assert_eq!(corpus.lines(), vec!["a".to_string(), "b".to_string()]);
    }
}
