use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Tag-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Remote article API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Paginated endpoint queried with `tagId`, `page` and `pageSize`
    pub endpoint: String,

    /// Prefix used to build article URLs (`{base}/{section}/{slug}-{id}`)
    #[serde(rename = "article-base-url")]
    pub article_base_url: String,

    /// Number of articles requested per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Crawl loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// First key of the enumeration space (inclusive)
    #[serde(rename = "first-key", default = "default_first_key")]
    pub first_key: u32,

    /// End of the enumeration space (exclusive)
    #[serde(rename = "max-key")]
    pub max_key: u32,

    /// Pause after every successfully processed page (milliseconds)
    #[serde(rename = "request-delay", default = "default_request_delay")]
    pub request_delay: u64,

    /// Base pause after a transport error (milliseconds)
    #[serde(rename = "error-delay", default = "default_error_delay")]
    pub error_delay: u64,

    /// Upper bound on the transport error pause (milliseconds)
    #[serde(rename = "max-error-delay", default)]
    pub max_error_delay: Option<u64>,

    /// How the error pause grows across consecutive failures
    #[serde(default)]
    pub backoff: BackoffShape,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay)
    }

    /// Effective backoff cap; defaults to the base error delay
    pub fn max_error_delay(&self) -> u64 {
        self.max_error_delay.unwrap_or(self.error_delay)
    }
}

/// Growth of the retry delay across consecutive transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffShape {
    /// Same delay every time
    #[default]
    Fixed,
    /// Doubling delay, capped at the configured maximum
    Exponential,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Checkpoint file (JSON)
    #[serde(rename = "state-path")]
    pub state_path: PathBuf,

    /// Corpus file, one article URL per line
    #[serde(rename = "corpus-path")]
    pub corpus_path: PathBuf,

    /// Category statistics file (JSON)
    #[serde(rename = "stats-path")]
    pub stats_path: PathBuf,

    /// Human-readable report written when the key space is exhausted
    #[serde(rename = "report-path")]
    pub report_path: PathBuf,

    /// Optional log file mirroring console output
    #[serde(rename = "log-path", default)]
    pub log_path: Option<PathBuf>,
}

fn default_page_size() -> u32 {
    24
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("tag-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_first_key() -> u32 {
    1
}

fn default_request_delay() -> u64 {
    1000
}

fn default_error_delay() -> u64 {
    15_000
}
