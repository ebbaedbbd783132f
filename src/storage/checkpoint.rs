//! JSON checkpoint file

use crate::state::CrawlState;
use crate::storage::atomic::write_atomic;
use crate::storage::traits::{CheckpointStore, StorageResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Checkpoint stored as a single JSON document, replaced atomically on save
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> CrawlState {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(
                    "Checkpoint {} not found, starting a new crawl",
                    self.path.display()
                );
                return CrawlState::new();
            }
            Err(e) => {
                tracing::error!(
                    "Failed to read checkpoint {}: {}. Starting over",
                    self.path.display(),
                    e
                );
                return CrawlState::new();
            }
        };

        match serde_json::from_str::<CrawlState>(&content) {
            Ok(state) => state.normalized(),
            Err(e) => {
                tracing::error!(
                    "Checkpoint {} is corrupt ({}). Starting over",
                    self.path.display(),
                    e
                );
                CrawlState::new()
            }
        }
    }

    fn save(&mut self, state: &CrawlState) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(state)?;
        write_atomic(&self.path, &json)
    }
}
