//! Output module for category statistics and reports
//!
//! This module handles:
//! - Accumulating per-category statistics during the crawl
//! - Rendering the final human-readable category report
//! - Printing crawl statistics to the console

mod report;
pub mod stats;

pub use report::{format_report, write_report};
pub use stats::{print_statistics, CategoryEntry, CategoryStats};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
