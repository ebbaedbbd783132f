//! Crawler module for tag pagination and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry on transport errors
//! - Parsing article pages into item records
//! - The resumable crawl loop over the key space

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{
    generate_report, run_crawl, Coordinator, CrawlOutcome, CrawlSettings, DriverPhase,
};
pub use fetcher::{build_http_client, HttpPageSource, PageFetcher, PageResult, PageSource};
pub use parser::{parse_page, ItemRecord, ParseError, RecordError};
