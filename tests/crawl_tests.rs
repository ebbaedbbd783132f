//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the article API and run full
//! crawls against file-backed state in a temp directory.

use serde_json::{json, Value};
use std::path::Path;
use tag_harvest::config::{ApiConfig, BackoffShape, Config, CrawlerConfig, OutputConfig};
use tag_harvest::crawler::run_crawl;
use tag_harvest::HarvestError;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PATH: &str = "/api/articles";

/// Creates a test configuration pointing at the mock server and a temp dir
fn create_test_config(server: &MockServer, dir: &Path, max_key: u32) -> Config {
    Config {
        api: ApiConfig {
            endpoint: format!("{}{}", server.uri(), API_PATH),
            article_base_url: "https://news.example.com/clanek".to_string(),
            page_size: 24,
            request_timeout: 5,
            user_agent: "TestBot/1.0".to_string(),
        },
        crawler: CrawlerConfig {
            first_key: 1,
            max_key,
            request_delay: 0,
            error_delay: 1,
            max_error_delay: None,
            backoff: BackoffShape::Fixed,
        },
        output: OutputConfig {
            state_path: dir.join("state.json"),
            corpus_path: dir.join("urls.txt"),
            stats_path: dir.join("category_stats.json"),
            report_path: dir.join("report.txt"),
            log_path: None,
        },
    }
}

fn articles(items: &[(u32, &str, &str)]) -> Value {
    let articles: Vec<Value> = items
        .iter()
        .map(|(id, slug, section)| {
            json!({"id": id, "slug": slug, "mainSection": {"path": section}, "title": slug})
        })
        .collect();
    json!({"data": {"articles": articles}})
}

async fn mount_page(server: &MockServer, key: u32, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("tagId", key.to_string()))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Every page not mounted before this one is empty
async fn mount_empty_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles(&[])))
        .mount(server)
        .await;
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).expect("file exists"))
        .expect("valid JSON")
}

fn corpus_lines(config: &Config) -> Vec<String> {
    std::fs::read_to_string(&config.output.corpus_path)
        .expect("corpus exists")
        .lines()
        .map(str::to_string)
        .collect()
}

async fn requested_pages(server: &MockServer) -> Vec<(String, String)> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .map(|request| {
            let query: std::collections::HashMap<_, _> =
                request.url.query_pairs().into_owned().collect();
            (query["tagId"].clone(), query["page"].clone())
        })
        .collect()
}

#[tokio::test]
async fn test_full_crawl_over_key_space() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        1,
        1,
        articles(&[(101, "volby", "domaci"), (102, "summit", "svet")]),
    )
    .await;
    mount_page(
        &server,
        3,
        1,
        articles(&[(101, "volby", "domaci"), (301, "derby", "sport")]),
    )
    .await;
    mount_empty_fallback(&server).await;

    let config = create_test_config(&server, dir.path(), 4);
    let outcome = run_crawl(&config, false).await.expect("crawl succeeds");

    assert_eq!(outcome.keys_completed, 3);
    assert_eq!(outcome.pages_processed, 2);
    assert_eq!(outcome.items_observed, 4);
    assert_eq!(outcome.novel_items, 3);

    assert_eq!(
        corpus_lines(&config),
        vec![
            "https://news.example.com/clanek/domaci/volby-101",
            "https://news.example.com/clanek/svet/summit-102",
            "https://news.example.com/clanek/sport/derby-301",
        ]
    );

    let stats = read_json(&config.output.stats_path);
    assert_eq!(stats["domaci"]["count"], 2);
    assert_eq!(stats["domaci"]["associated_tags"], json!([1, 3]));
    assert_eq!(stats["sport"]["count"], 1);

    let state = read_json(&config.output.state_path);
    assert_eq!(
        state,
        json!({"current_tag_in_progress": null, "next_page": 1, "completed_tags": [1, 2, 3]})
    );

    let report = std::fs::read_to_string(&config.output.report_path).unwrap();
    assert!(report.contains("TOTAL OBSERVATIONS: 4"));
    assert!(report.contains("Domaci: 2 articles (found under keys: [1, 3])"));
}

#[tokio::test]
async fn test_requests_carry_pagination_parameters() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("tagId", "1"))
        .and(query_param("page", "1"))
        .and(query_param("pageSize", "24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path(), 2);
    run_crawl(&config, false).await.expect("crawl succeeds");

    server.verify().await;
}

#[tokio::test]
async fn test_resume_from_checkpoint() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path(), 3);

    std::fs::write(
        &config.output.state_path,
        r#"{"current_tag_in_progress": 2, "next_page": 3, "completed_tags": [1]}"#,
    )
    .unwrap();

    mount_page(&server, 2, 3, articles(&[(250, "pozdni", "kultura")])).await;
    mount_empty_fallback(&server).await;

    run_crawl(&config, false).await.expect("crawl succeeds");

    let pages = requested_pages(&server).await;
    assert_eq!(pages[0], ("2".to_string(), "3".to_string()));
    assert_eq!(pages[1], ("2".to_string(), "4".to_string()));
    assert_eq!(pages.len(), 2);

    let state = read_json(&config.output.state_path);
    assert_eq!(state["completed_tags"], json!([1, 2]));
}

#[tokio::test]
async fn test_transport_error_is_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("tagId", "1"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, 1, 1, articles(&[(11, "obnova", "domaci")])).await;
    mount_empty_fallback(&server).await;

    let config = create_test_config(&server, dir.path(), 2);
    run_crawl(&config, false).await.expect("crawl succeeds");

    let pages = requested_pages(&server).await;
    let first_page_attempts = pages
        .iter()
        .filter(|(key, page)| key == "1" && page == "1")
        .count();
    assert_eq!(first_page_attempts, 3);

    assert_eq!(corpus_lines(&config).len(), 1);
    let stats = read_json(&config.output.stats_path);
    assert_eq!(stats["domaci"]["count"], 1);
}

#[tokio::test]
async fn test_malformed_page_skips_rest_of_key() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, 1, articles(&[(1, "prvni", "domaci")])).await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("tagId", "1"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    mount_page(&server, 1, 3, articles(&[(3, "treti", "domaci")])).await;
    mount_empty_fallback(&server).await;

    let config = create_test_config(&server, dir.path(), 3);
    run_crawl(&config, false).await.expect("crawl succeeds");

    let pages = requested_pages(&server).await;
    assert!(!pages.contains(&("1".to_string(), "3".to_string())));
    assert!(pages.contains(&("2".to_string(), "1".to_string())));

    assert_eq!(corpus_lines(&config).len(), 1);
    let state = read_json(&config.output.state_path);
    assert_eq!(state["completed_tags"], json!([1, 2]));
}

#[tokio::test]
async fn test_rescan_counts_again_without_duplicating_corpus() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        1,
        1,
        articles(&[(1, "a", "domaci"), (2, "b", "domaci")]),
    )
    .await;
    mount_empty_fallback(&server).await;

    let config = create_test_config(&server, dir.path(), 2);
    run_crawl(&config, false).await.expect("first crawl");
    run_crawl(&config, true).await.expect("fresh rescan");

    assert_eq!(corpus_lines(&config).len(), 2);
    let stats = read_json(&config.output.stats_path);
    assert_eq!(stats["domaci"]["count"], 4);
    assert_eq!(stats["domaci"]["associated_tags"], json!([1]));
}

#[tokio::test]
async fn test_second_run_fetches_nothing_when_done() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_empty_fallback(&server).await;

    let config = create_test_config(&server, dir.path(), 3);
    run_crawl(&config, false).await.expect("first crawl");
    let after_first = requested_pages(&server).await.len();

    run_crawl(&config, false).await.expect("second crawl");

    assert_eq!(requested_pages(&server).await.len(), after_first);
    assert!(!config.output.report_path.exists());
}

#[tokio::test]
async fn test_corrupt_state_files_start_over() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path(), 2);

    std::fs::write(&config.output.state_path, "{not json").unwrap();
    std::fs::write(&config.output.stats_path, "[1, 2").unwrap();
    mount_page(&server, 1, 1, articles(&[(5, "znovu", "svet")])).await;
    mount_empty_fallback(&server).await;

    run_crawl(&config, false).await.expect("crawl succeeds");

    let stats = read_json(&config.output.stats_path);
    assert_eq!(stats, json!({"svet": {"count": 1, "associated_tags": [1]}}));
}

#[tokio::test]
async fn test_invalid_endpoint_is_reported() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, dir.path(), 2);
    config.api.endpoint = "not a url".to_string();

    let result = run_crawl(&config, false).await;
    assert!(matches!(result, Err(HarvestError::UrlParse(_))));
}
