//! Tag-Harvest: a resumable tag-indexed article crawler
//!
//! This crate walks an ascending range of integer tag identifiers against a
//! paginated article API, deduplicates discovered article URLs against a
//! growing corpus and keeps per-category statistics up to date while the
//! crawl is running. All progress is checkpointed to disk after every page so
//! a multi-day crawl can be killed and resumed at any point.

pub mod config;
pub mod crawler;
pub mod output;
pub mod retry;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Tag-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Gave up on key {key} page {page} after {attempts} failed attempts")]
    RetriesExhausted { key: u32, page: u32, attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Tag-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlOutcome, ItemRecord, PageResult};
pub use output::CategoryStats;
pub use retry::RetryPolicy;
pub use state::{CrawlState, KeyState};
