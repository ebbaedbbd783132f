//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop, which:
//! - Loads the checkpoint, corpus and category statistics
//! - Computes the resume point and walks the key space in ascending order
//! - Paginates each key until an empty (or malformed) page
//! - Persists statistics and checkpoint after every page
//!
//! Ordering per page: corpus appends (durable per line), then statistics,
//! then the checkpoint. A crash therefore replays at most the page in flight,
//! which the corpus absorbs and the statistics count again.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{HttpPageSource, PageFetcher, PageResult, PageSource};
use crate::crawler::parser::ItemRecord;
use crate::output::{write_report, CategoryStats};
use crate::retry::RetryPolicy;
use crate::state::CrawlState;
use crate::storage::Stores;
use crate::HarvestError;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Where the driver currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    /// Loading durable state and computing the resume point
    Resuming,
    /// Deciding whether a key needs work
    Scanning { key: u32 },
    /// Waiting on a page fetch
    Paginating { key: u32, page: u32 },
    /// Recording a fetched page
    Draining { key: u32, page: u32 },
    /// The page could not be used
    Erroring { key: u32, page: u32 },
    /// Closing out a key
    Advancing { key: u32 },
    /// The key space is exhausted
    Finished,
}

impl fmt::Display for DriverPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resuming => write!(f, "resuming"),
            Self::Scanning { key } => write!(f, "scanning key {}", key),
            Self::Paginating { key, page } => write!(f, "paginating key {} page {}", key, page),
            Self::Draining { key, page } => write!(f, "draining key {} page {}", key, page),
            Self::Erroring { key, page } => write!(f, "erroring on key {} page {}", key, page),
            Self::Advancing { key } => write!(f, "advancing past key {}", key),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Crawl loop parameters
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// First key of the key space (inclusive)
    pub first_key: u32,
    /// End of the key space (exclusive)
    pub max_key: u32,
    /// Pause after every processed page
    pub request_delay: Duration,
    /// Prefix for article identifiers
    pub article_base_url: String,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.crawler, &config.api.article_base_url)
    }

    pub fn new(crawler: &CrawlerConfig, article_base_url: &str) -> Self {
        Self {
            first_key: crawler.first_key,
            max_key: crawler.max_key,
            request_delay: crawler.request_delay(),
            article_base_url: article_base_url.to_string(),
        }
    }
}

/// Counters for one invocation of `Coordinator::run`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// Keys the driver fetched at least one page for
    pub keys_visited: u64,
    /// Keys added to the completed set
    pub keys_completed: u64,
    /// Non-empty pages recorded
    pub pages_processed: u64,
    /// Articles counted in the category statistics
    pub items_observed: u64,
    /// Articles dropped because their identifier could not be built
    pub items_dropped: u64,
    /// Articles appended to the corpus
    pub novel_items: u64,
}

/// Main crawler coordinator structure
pub struct Coordinator<S = HttpPageSource> {
    fetcher: PageFetcher<S>,
    stores: Stores,
    settings: CrawlSettings,
    state: CrawlState,
    stats: CategoryStats,
    phase: DriverPhase,
}

impl Coordinator<HttpPageSource> {
    /// Creates a coordinator backed by the configured files and HTTP API
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fresh` - Discard the checkpoint; corpus and statistics are kept
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - Failed to open storage or build the client
    pub fn new(config: &Config, fresh: bool) -> Result<Self, HarvestError> {
        let mut stores = Stores::open(&config.output)?;
        if fresh {
            tracing::info!("Discarding checkpoint, starting from the first key");
            stores.checkpoint.save(&CrawlState::new())?;
        }

        let source = HttpPageSource::from_config(&config.api)?;
        let policy = RetryPolicy::from_config(&config.crawler);

        Ok(Self::with_parts(
            source,
            policy,
            stores,
            CrawlSettings::from_config(config),
        ))
    }
}

impl<S: PageSource> Coordinator<S> {
    /// Assembles a coordinator from explicit parts and loads durable state
    pub fn with_parts(
        source: S,
        policy: RetryPolicy,
        stores: Stores,
        settings: CrawlSettings,
    ) -> Self {
        let state = stores.checkpoint.load();
        let stats = stores.categories.load();

        tracing::info!(
            "Loaded checkpoint: {} completed keys, in progress: {:?}; {} categories; {} known articles",
            state.completed_keys.len(),
            state.current_key,
            stats.len(),
            stores.corpus.len()
        );

        Self {
            fetcher: PageFetcher::new(source, policy),
            stores,
            settings,
            state,
            stats,
            phase: DriverPhase::Resuming,
        }
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn stats(&self) -> &CategoryStats {
        &self.stats
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    pub fn corpus_len(&self) -> usize {
        self.stores.corpus.len()
    }

    fn set_phase(&mut self, phase: DriverPhase) {
        tracing::trace!("Driver phase: {}", phase);
        self.phase = phase;
    }

    /// Runs the crawl over the remaining key space
    ///
    /// Keys below the resume point are never revisited, even if they are not
    /// in the completed set. Only the key in flight resumes mid-pagination.
    pub async fn run(&mut self) -> Result<CrawlOutcome, HarvestError> {
        self.set_phase(DriverPhase::Resuming);
        let start_key = self.state.resume_key(self.settings.first_key);
        tracing::info!(
            "Resuming from key {} (key space ends before {})",
            start_key,
            self.settings.max_key
        );

        let mut outcome = CrawlOutcome::default();
        let started = Instant::now();

        for key in start_key..self.settings.max_key {
            self.set_phase(DriverPhase::Scanning { key });

            if self.state.is_completed(key) {
                continue;
            }

            self.crawl_key(key, &mut outcome)
                .instrument(tracing::info_span!("key", key))
                .await?;

            if key % 100 == 0 {
                tracing::info!(
                    "Progress: scanned up to key {}, {} pages, {} new articles in {:?}",
                    key,
                    outcome.pages_processed,
                    outcome.novel_items,
                    started.elapsed()
                );
            }
        }

        self.set_phase(DriverPhase::Finished);
        tracing::info!(
            "All keys below {} checked: {} keys completed, {} pages, {} articles observed, {} new",
            self.settings.max_key,
            outcome.keys_completed,
            outcome.pages_processed,
            outcome.items_observed,
            outcome.novel_items
        );

        Ok(outcome)
    }

    /// Paginates one key to exhaustion and marks it completed
    async fn crawl_key(&mut self, key: u32, outcome: &mut CrawlOutcome) -> Result<(), HarvestError> {
        let mut page = self.state.key_state(key).start_page().unwrap_or(1);
        if page > 1 {
            tracing::info!("Resuming key at page {}", page);
        }

        let mut pages_fetched = 0u32;

        loop {
            self.set_phase(DriverPhase::Paginating { key, page });

            match self.fetcher.fetch(key, page).await {
                PageResult::Items(items) if items.is_empty() => {
                    pages_fetched += 1;
                    if page == 1 {
                        tracing::debug!("Key is empty");
                    } else {
                        tracing::info!("End of articles after page {}", page - 1);
                    }
                    break;
                }
                PageResult::Items(items) => {
                    pages_fetched += 1;
                    if page == 1 {
                        tracing::info!("Found articles, processing from page {}", page);
                    }

                    self.set_phase(DriverPhase::Draining { key, page });
                    self.record_page(key, page, &items, outcome)?;

                    page += 1;
                    tokio::time::sleep(self.settings.request_delay).await;
                }
                PageResult::MalformedResponse(cause) => {
                    // Only ends the key when an earlier page of it was recorded
                    if page > 1 {
                        pages_fetched += 1;
                    }
                    self.set_phase(DriverPhase::Erroring { key, page });
                    tracing::error!(page, "Malformed response ({}), skipping rest of key", cause);
                    break;
                }
                PageResult::TransportError(cause) => {
                    self.set_phase(DriverPhase::Erroring { key, page });
                    tracing::error!(page, "Stopping crawl: {}", cause);
                    return Err(HarvestError::RetriesExhausted {
                        key,
                        page,
                        attempts: self.fetcher.policy().max_attempts().unwrap_or(0),
                    });
                }
            }
        }

        self.set_phase(DriverPhase::Advancing { key });
        let completed = pages_fetched > 0;
        self.state.finish_key(key, completed);
        self.stores.checkpoint.save(&self.state)?;

        outcome.keys_visited += 1;
        if completed {
            outcome.keys_completed += 1;
        }

        Ok(())
    }

    /// Applies one non-empty page to corpus, statistics and checkpoint
    fn record_page(
        &mut self,
        key: u32,
        page: u32,
        items: &[ItemRecord],
        outcome: &mut CrawlOutcome,
    ) -> Result<(), HarvestError> {
        let mut novel = 0u64;
        let mut dropped = 0u64;

        for item in items {
            let identifier = match item.identifier(&self.settings.article_base_url) {
                Ok(identifier) => identifier,
                Err(e) => {
                    tracing::warn!(page, "Dropping article: {}", e);
                    dropped += 1;
                    continue;
                }
            };

            if let Some(category) = item.category() {
                self.stats.record_observation(category, key);
            }

            if !self.stores.corpus.contains(&identifier) && self.stores.corpus.append(&identifier)? {
                novel += 1;
            }
        }

        self.stores.categories.save(&self.stats)?;
        self.state.record_page(key, page);
        self.stores.checkpoint.save(&self.state)?;

        let observed = items.len() as u64 - dropped;
        outcome.pages_processed += 1;
        outcome.items_observed += observed;
        outcome.items_dropped += dropped;
        outcome.novel_items += novel;

        tracing::info!(
            page,
            items = items.len(),
            novel,
            "Page processed"
        );

        Ok(())
    }
}

/// Runs the main crawl operation and writes the report at the end
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `fresh` - Discard the checkpoint before starting
///
/// # Example
///
/// ```no_run
/// use tag_harvest::config::load_config;
/// use tag_harvest::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// run_crawl(&config, false).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, fresh: bool) -> Result<CrawlOutcome, HarvestError> {
    let mut coordinator = Coordinator::new(config, fresh)?;
    let outcome = coordinator.run().await?;
    generate_report(coordinator.stats(), &config.output.report_path)?;
    Ok(outcome)
}

/// Writes the final category report
pub fn generate_report(stats: &CategoryStats, path: &Path) -> Result<bool, HarvestError> {
    tracing::info!("Generating final report...");
    Ok(write_report(stats, path)?)
}
