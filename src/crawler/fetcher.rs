//! Page fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Requesting one page of articles for a key
//! - Classifying the outcome (items / transport error / malformed response)
//! - Retrying transport errors according to a `RetryPolicy`

use crate::config::ApiConfig;
use crate::crawler::parser::{parse_page, ItemRecord};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Outcome of fetching one page of one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResult {
    /// The page parsed; an empty list means there are no articles on it
    Items(Vec<ItemRecord>),

    /// Network failure, timeout or non-2xx status
    TransportError(String),

    /// A response arrived but is not an article page
    MalformedResponse(String),
}

/// Anything that can serve pages of articles by key
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Makes a single attempt at `page` of `key`
    async fn fetch(&self, key: u32, page: u32) -> PageResult;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The API configuration (user agent, timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Article API reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    endpoint: Url,
    page_size: u32,
}

impl HttpPageSource {
    pub fn new(client: Client, endpoint: Url, page_size: u32) -> Self {
        Self {
            client,
            endpoint,
            page_size,
        }
    }

    /// Builds the client and endpoint from API configuration
    pub fn from_config(config: &ApiConfig) -> crate::Result<Self> {
        let client = build_http_client(config)?;
        let endpoint = Url::parse(&config.endpoint)?;
        Ok(Self::new(client, endpoint, config.page_size))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    /// Fetches one page
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx, body parses | Items |
    /// | 2xx, body is not an article page | MalformedResponse |
    /// | non-2xx status | TransportError |
    /// | timeout / connect / body read failure | TransportError |
    async fn fetch(&self, key: u32, page: u32) -> PageResult {
        let request = self.client.get(self.endpoint.clone()).query(&[
            ("tagId", key),
            ("page", page),
            ("pageSize", self.page_size),
        ]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return PageResult::TransportError(describe_error(&e)),
        };

        let status = response.status();
        if !status.is_success() {
            return PageResult::TransportError(format!("HTTP {}", status.as_u16()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return PageResult::TransportError(describe_error(&e)),
        };

        match parse_page(&body) {
            Ok(items) => PageResult::Items(items),
            Err(e) => PageResult::MalformedResponse(e.to_string()),
        }
    }
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timeout: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}

/// Page source plus the retry policy applied to its transport errors
pub struct PageFetcher<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: PageSource> PageFetcher<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches a page, retrying the same page after every transport error
    ///
    /// Only returns `TransportError` once the policy gives up, which an
    /// unbounded policy never does.
    pub async fn fetch(&self, key: u32, page: u32) -> PageResult {
        let mut failures = 0u32;
        loop {
            match self.source.fetch(key, page).await {
                PageResult::TransportError(cause) => {
                    failures += 1;
                    if !self.policy.should_retry(failures) {
                        tracing::error!(
                            key,
                            page,
                            attempts = failures,
                            "Giving up after transport error: {}",
                            cause
                        );
                        return PageResult::TransportError(cause);
                    }

                    let delay = self.policy.delay(failures);
                    tracing::warn!(
                        key,
                        page,
                        attempt = failures,
                        "Transport error: {}. Retrying in {:?}",
                        cause,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                other => {
                    if failures > 0 {
                        tracing::info!(key, page, "Recovered after {} failed attempts", failures);
                    }
                    return other;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted {
        results: Mutex<VecDeque<PageResult>>,
        calls: Mutex<Vec<(u32, u32)>>,
    }

    impl Scripted {
        fn new(results: Vec<PageResult>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageSource for Scripted {
        async fn fetch(&self, key: u32, page: u32) -> PageResult {
            self.calls.lock().unwrap().push((key, page));
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(PageResult::Items(vec![]))
        }
    }

    fn create_test_config() -> ApiConfig {
        ApiConfig {
            endpoint: "https://news.example.com/api/articles".to_string(),
            article_base_url: "https://news.example.com/clanek".to_string(),
            page_size: 24,
            request_timeout: 30,
            user_agent: "TestCrawler/1.0".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&create_test_config()).is_ok());
    }

    #[test]
    fn test_source_from_config() {
        let source = HttpPageSource::from_config(&create_test_config()).unwrap();
        assert_eq!(source.endpoint.path(), "/api/articles");
        assert_eq!(source.page_size, 24);
    }

    #[tokio::test]
    async fn test_retries_same_page_until_success() {
        let source = Scripted::new(vec![
            PageResult::TransportError("HTTP 503".to_string()),
            PageResult::TransportError("HTTP 503".to_string()),
            PageResult::Items(vec![ItemRecord::new("1", "a", "domaci")]),
        ]);
        let fetcher = PageFetcher::new(source, RetryPolicy::fixed(Duration::ZERO));

        let result = fetcher.fetch(44, 1).await;

        assert_eq!(
            result,
            PageResult::Items(vec![ItemRecord::new("1", "a", "domaci")])
        );
        assert_eq!(
            *fetcher.source().calls.lock().unwrap(),
            vec![(44, 1), (44, 1), (44, 1)]
        );
    }

    #[tokio::test]
    async fn test_bounded_policy_gives_up() {
        let source = Scripted::new(vec![
            PageResult::TransportError("timeout".to_string()),
            PageResult::TransportError("timeout".to_string()),
            PageResult::Items(vec![]),
        ]);
        let policy = RetryPolicy::fixed(Duration::ZERO).with_max_attempts(2);
        let fetcher = PageFetcher::new(source, policy);

        let result = fetcher.fetch(5, 3).await;

        assert_eq!(result, PageResult::TransportError("timeout".to_string()));
        assert_eq!(fetcher.source().calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_is_not_retried() {
        let source = Scripted::new(vec![PageResult::MalformedResponse("bad".to_string())]);
        let fetcher = PageFetcher::new(source, RetryPolicy::fixed(Duration::ZERO));

        let result = fetcher.fetch(5, 1).await;

        assert!(matches!(result, PageResult::MalformedResponse(_)));
        assert_eq!(fetcher.source().calls.lock().unwrap().len(), 1);
    }
}
