//! Checkpoint record of the crawl
//!
//! Serialized as `{current_tag_in_progress, next_page, completed_tags}` so the
//! file stays readable by anything that consumed earlier checkpoints.

use crate::state::KeyState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Progress of the crawl across the whole key space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    /// Key currently being paginated, `None` between keys
    #[serde(rename = "current_tag_in_progress")]
    pub current_key: Option<u32>,

    /// Next page to fetch for `current_key`; 1 when `current_key` is `None`
    #[serde(default = "first_page")]
    pub next_page: u32,

    /// Keys whose pagination reached its end
    #[serde(rename = "completed_tags", default)]
    pub completed_keys: BTreeSet<u32>,
}

fn first_page() -> u32 {
    1
}

impl Default for CrawlState {
    fn default() -> Self {
        Self {
            current_key: None,
            next_page: 1,
            completed_keys: BTreeSet::new(),
        }
    }
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the settled-state invariants after loading from disk
    ///
    /// A missing key in flight resets `next_page` to 1, page 0 becomes 1, and a
    /// key in flight that is already completed is dropped.
    pub fn normalized(mut self) -> Self {
        if let Some(key) = self.current_key {
            if self.completed_keys.contains(&key) {
                self.current_key = None;
            }
        }
        if self.current_key.is_none() || self.next_page < 1 {
            self.next_page = 1;
        }
        self
    }

    /// First key the driver should look at
    ///
    /// The key in flight if any, else one past the highest completed key,
    /// else `first_key`. Never below `first_key`.
    pub fn resume_key(&self, first_key: u32) -> u32 {
        let key = match (self.current_key, self.completed_keys.last()) {
            (Some(current), _) => current,
            (None, Some(&highest)) => highest.saturating_add(1),
            (None, None) => first_key,
        };
        key.max(first_key)
    }

    pub fn is_completed(&self, key: u32) -> bool {
        self.completed_keys.contains(&key)
    }

    /// Lifecycle state of `key` as recorded in this checkpoint
    pub fn key_state(&self, key: u32) -> KeyState {
        if self.is_completed(key) {
            KeyState::Completed
        } else if self.current_key == Some(key) {
            KeyState::InProgress {
                next_page: self.next_page.max(1),
            }
        } else {
            KeyState::NotStarted
        }
    }

    /// Records that `page` of `key` was fully processed
    pub fn record_page(&mut self, key: u32, page: u32) {
        self.current_key = Some(key);
        self.next_page = page + 1;
    }

    /// Clears the key in flight and optionally marks `key` completed
    pub fn finish_key(&mut self, key: u32, mark_completed: bool) {
        self.current_key = None;
        self.next_page = 1;
        if mark_completed {
            self.completed_keys.insert(key);
        }
    }
}
