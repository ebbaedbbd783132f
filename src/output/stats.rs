//! Per-category statistics
//!
//! Counts raw observations: an article seen again under another key (or on a
//! replayed page) is counted again, even though the corpus ignores it.

use crate::state::CrawlState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Statistics for one category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Number of articles observed in this category
    pub count: u64,

    /// Every key under which this category showed up
    #[serde(rename = "associated_tags", default)]
    pub associated_keys: BTreeSet<u32>,
}

/// Category path -> statistics, serialized as a plain JSON object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryStats {
    categories: BTreeMap<String, CategoryEntry>,
}

impl CategoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one article of `category` seen while paginating `key`
    pub fn record_observation(&mut self, category: &str, key: u32) {
        let entry = self.categories.entry(category.to_string()).or_default();
        entry.count += 1;
        entry.associated_keys.insert(key);
    }

    pub fn get(&self, category: &str) -> Option<&CategoryEntry> {
        self.categories.get(category)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Sum of all category counts
    pub fn total_observations(&self) -> u64 {
        self.categories.values().map(|entry| entry.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryEntry)> {
        self.categories
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    /// Categories ordered by count, largest first
    pub fn sorted_by_count(&self) -> Vec<(&str, &CategoryEntry)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        sorted
    }
}

/// Prints an overview of the durable crawl state to stdout
///
/// # Arguments
///
/// * `state` - The loaded checkpoint
/// * `stats` - The loaded category statistics
/// * `corpus_size` - Number of distinct article URLs in the corpus
/// * `first_key` - First key of the configured key space
/// * `top` - How many categories to list
pub fn print_statistics(
    state: &CrawlState,
    stats: &CategoryStats,
    corpus_size: usize,
    first_key: u32,
    top: usize,
) {
    println!("=== Crawl Statistics ===\n");

    println!("Progress:");
    println!("  Completed keys: {}", state.completed_keys.len());
    if let Some(highest) = state.completed_keys.last() {
        println!("  Highest completed key: {}", highest);
    }
    match state.current_key {
        Some(key) => println!("  In progress: key {} (next page {})", key, state.next_page),
        None => println!("  In progress: none"),
    }
    println!("  Resume point: key {}", state.resume_key(first_key));
    println!();

    println!("Corpus:");
    println!("  Unique article URLs: {}", corpus_size);
    println!();

    println!("Categories ({}):", stats.len());
    println!("  Total observations: {}", stats.total_observations());
    for (name, entry) in stats.sorted_by_count().into_iter().take(top) {
        println!(
            "  {}: {} ({} keys)",
            name,
            entry.count,
            entry.associated_keys.len()
        );
    }
}
