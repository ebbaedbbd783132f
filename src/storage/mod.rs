//! Storage module for persisting crawl progress
//!
//! This module handles all durable state of the crawler:
//! - The checkpoint (key in flight, next page, completed keys)
//! - The append-only corpus of article URLs
//! - The per-category statistics
//!
//! File-backed stores are used in production; the in-memory stores share the
//! same traits and back the driver tests.

mod atomic;
mod category;
mod checkpoint;
mod corpus;
mod memory;
mod traits;

pub use atomic::write_atomic;
pub use category::JsonCategoryStore;
pub use checkpoint::JsonCheckpointStore;
pub use corpus::{load_all, FileCorpusIndex};
pub use memory::{MemoryCategoryStore, MemoryCheckpointStore, MemoryCorpusIndex};
pub use traits::{CategoryStore, CheckpointStore, CorpusIndex, StorageError, StorageResult};

use crate::config::OutputConfig;

/// The three durable stores a crawl needs
pub struct Stores {
    pub checkpoint: Box<dyn CheckpointStore + Send>,
    pub corpus: Box<dyn CorpusIndex + Send>,
    pub categories: Box<dyn CategoryStore + Send>,
}

impl Stores {
    /// Opens the file-backed stores named in the output configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Stores)` - Corpus loaded and all paths usable
    /// * `Err(StorageError)` - The corpus file could not be read or created
    pub fn open(config: &OutputConfig) -> StorageResult<Self> {
        Ok(Self {
            checkpoint: Box::new(JsonCheckpointStore::new(&config.state_path)),
            corpus: Box::new(FileCorpusIndex::open(&config.corpus_path)?),
            categories: Box::new(JsonCategoryStore::new(&config.stats_path)),
        })
    }

    /// In-memory stores; the returned handles observe everything the crawl saves
    pub fn in_memory(
        checkpoint: MemoryCheckpointStore,
        corpus: MemoryCorpusIndex,
        categories: MemoryCategoryStore,
    ) -> Self {
        Self {
            checkpoint: Box::new(checkpoint),
            corpus: Box::new(corpus),
            categories: Box::new(categories),
        }
    }
}
