//! Storage traits and error types
//!
//! The crawler persists three things: the checkpoint, the corpus of article
//! URLs and the category statistics. Each sits behind a small trait so the
//! driver can run against files in production and in-memory fakes in tests.

use crate::output::CategoryStats;
use crate::state::CrawlState;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable home of the crawl checkpoint
pub trait CheckpointStore {
    /// Loads the last saved checkpoint
    ///
    /// A missing or unreadable checkpoint yields a fresh state; it is never
    /// an error.
    fn load(&self) -> CrawlState;

    /// Replaces the checkpoint; must be atomic with respect to a crash
    fn save(&mut self, state: &CrawlState) -> StorageResult<()>;
}

/// Append-only set of article identifiers already emitted
pub trait CorpusIndex {
    /// Returns true if the identifier was emitted before
    fn contains(&self, identifier: &str) -> bool;

    /// Adds an identifier, durably, unless already present
    ///
    /// Returns `Ok(true)` when the identifier was new.
    fn append(&mut self, identifier: &str) -> StorageResult<bool>;

    /// Number of distinct identifiers in the corpus
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Durable home of the per-category statistics
pub trait CategoryStore {
    /// Loads saved statistics; corrupt data yields empty statistics
    fn load(&self) -> CategoryStats;

    /// Overwrites the statistics atomically
    fn save(&mut self, stats: &CategoryStats) -> StorageResult<()>;
}
