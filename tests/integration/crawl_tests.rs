//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::time::Duration;
use sumi_skim::config::CrawlConfig;
use sumi_skim::crawler::{run_crawl, Coordinator, FetchError};
use sumi_skim::output::{CrawlObservation, FetchOutcome, MemorySink};
use sumi_skim::{CrawlSummary, ScopeMode, SkimError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted at the mock server, with pacing off
fn create_test_config(base_url: &str, max_depth: u32, concurrency: u32) -> CrawlConfig {
    let mut config = CrawlConfig::for_seed(base_url);
    config.crawl.max_depth = max_depth;
    config.crawl.concurrency = concurrency;
    config.request.min_delay_ms = 0;
    config.request.max_delay_ms = 0;
    config.request.timeout_secs = 5;
    config
}

fn html_page(links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{}\">link</a>\n", href))
        .collect();

    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", anchors),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page: &str, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html_page(links))
        .mount(server)
        .await;
}

async fn crawl(config: CrawlConfig) -> (CrawlSummary, Vec<CrawlObservation>) {
    let sink = MemorySink::new();
    let summary = Coordinator::new(config)
        .expect("Failed to create coordinator")
        .run_with_sink(sink.clone())
        .await
        .expect("Crawl failed");
    (summary, sink.observations())
}

fn sorted_urls(observations: &[CrawlObservation]) -> Vec<String> {
    let mut urls: Vec<_> = observations.iter().map(|o| o.url.clone()).collect();
    urls.sort();
    urls
}

#[tokio::test]
async fn test_crawl_stays_on_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        &["/a", "/b", "http://other.example/x"],
    )
    .await;
    mount_page(&mock_server, "/a", &[]).await;
    mount_page(&mock_server, "/b", &[]).await;

    let (summary, observations) = crawl(create_test_config(&base_url, 1, 5)).await;

    assert_eq!(
        sorted_urls(&observations),
        vec![
            format!("{}/", base_url),
            format!("{}/a", base_url),
            format!("{}/b", base_url),
        ]
    );
    assert!(observations
        .iter()
        .all(|o| o.outcome == FetchOutcome::Response { status: 200 }));
    assert_eq!(summary.observations, 3);
    assert_eq!(summary.links_out_of_scope, 1);
    assert_eq!(summary.rows_written, 3);
}

#[tokio::test]
async fn test_fragment_and_query_variants_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", &["/a", "/a#section", "/a?ref=nav"]).await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page(&["/", "#top"]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (_summary, observations) = crawl(create_test_config(&base_url, 2, 3)).await;

    let a_count = observations
        .iter()
        .filter(|o| o.url == format!("{}/a", base_url))
        .count();
    assert_eq!(a_count, 1);
    assert_eq!(observations.len(), 2);
}

#[tokio::test]
async fn test_non_http_links_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        &["javascript:void(0)", "mailto:someone@example.com", "/real"],
    )
    .await;
    mount_page(&mock_server, "/real", &[]).await;

    let (summary, observations) = crawl(create_test_config(&base_url, 1, 2)).await;

    assert_eq!(
        sorted_urls(&observations),
        vec![format!("{}/", base_url), format!("{}/real", base_url)]
    );
    assert_eq!(summary.links_invalid, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_limit_respected() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let pages: Vec<String> = (0..10).map(|i| format!("/page{}", i)).collect();
    let links: Vec<&str> = pages.iter().map(String::as_str).collect();
    mount_page(&mock_server, "/", &links).await;

    Mock::given(method("GET"))
        .and(wiremock::matchers::path_regex(r"^/page\d+$"))
        .respond_with(html_page(&[]).set_delay(Duration::from_millis(150)))
        .expect(10)
        .mount(&mock_server)
        .await;

    let (summary, observations) = crawl(create_test_config(&base_url, 1, 2)).await;

    assert_eq!(observations.len(), 11);
    assert!(summary.peak_in_flight <= 2);
    assert_eq!(summary.peak_in_flight, 2);

    // Sweep fetch intervals; ends sort before starts at equal instants.
    let mut events: Vec<_> = observations
        .iter()
        .flat_map(|o| [(o.started_at, 1i32), (o.finished_at, -1i32)])
        .collect();
    events.sort();

    let mut current = 0;
    let mut max_overlap = 0;
    for (_, delta) in events {
        current += delta;
        max_overlap = max_overlap.max(current);
    }
    assert!(max_overlap <= 2, "observed {} overlapping fetches", max_overlap);
}

#[tokio::test]
async fn test_transport_error_recorded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Port 1 refuses connections; the host still matches the seed's scope.
    mount_page(&mock_server, "/", &["http://127.0.0.1:1/dead"]).await;

    let (summary, observations) = crawl(create_test_config(&base_url, 1, 2)).await;

    let dead = observations
        .iter()
        .find(|o| o.url == "http://127.0.0.1:1/dead")
        .expect("dead link should be observed");
    assert!(matches!(
        dead.outcome,
        FetchOutcome::Failed(FetchError::Connect(_))
    ));
    assert_eq!(dead.status_label(), "error:connect");
    assert_eq!(summary.transport_errors, 1);
    assert_eq!(summary.successes, 1);
}

#[tokio::test]
async fn test_depth_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", &["/level1"]).await;
    mount_page(&mock_server, "/level1", &["/level2"]).await;
    mount_page(&mock_server, "/level2", &["/level3"]).await;
    Mock::given(method("GET"))
        .and(path("/level3"))
        .respond_with(html_page(&[]))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (_summary, observations) = crawl(create_test_config(&base_url, 2, 2)).await;

    assert_eq!(observations.len(), 3);
    assert!(observations.iter().all(|o| o.depth <= 2));

    let level2 = observations
        .iter()
        .find(|o| o.url.ends_with("/level2"))
        .expect("level2 should be fetched");
    assert_eq!(level2.depth, 2);
}

#[tokio::test]
async fn test_http_error_and_non_html_not_expanded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", &["/missing", "/report.pdf"]).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_raw("<a href=\"/from-404\">x</a>", "text/html"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<a href=\"/from-pdf\">x</a>", "application/pdf"),
        )
        .mount(&mock_server)
        .await;
    for unreachable in ["/from-404", "/from-pdf"] {
        Mock::given(method("GET"))
            .and(path(unreachable))
            .respond_with(html_page(&[]))
            .expect(0)
            .mount(&mock_server)
            .await;
    }

    let (summary, observations) = crawl(create_test_config(&base_url, 3, 2)).await;

    assert_eq!(observations.len(), 3);
    let missing = observations
        .iter()
        .find(|o| o.url.ends_with("/missing"))
        .expect("404 page should be observed");
    assert_eq!(missing.outcome, FetchOutcome::Response { status: 404 });
    assert_eq!(summary.http_errors, 1);
    assert_eq!(summary.successes, 2);
}

#[tokio::test]
async fn test_exact_scope_rejects_other_hosts() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        &["/same", "http://sub.127.0.0.1.example/elsewhere"],
    )
    .await;
    mount_page(&mock_server, "/same", &[]).await;

    let mut config = create_test_config(&base_url, 1, 2);
    config.crawl.scope = ScopeMode::Exact;
    let (summary, observations) = crawl(config).await;

    assert_eq!(observations.len(), 2);
    assert_eq!(summary.links_out_of_scope, 1);
}

#[tokio::test]
async fn test_run_crawl_writes_csv() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", &["/a"]).await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("crawl.csv");

    let mut config = create_test_config(&base_url, 1, 2);
    config.output.csv_path = Some(csv_path.clone());

    let summary = run_crawl(config).await.expect("Crawl failed");
    assert_eq!(summary.rows_written, 2);

    let contents = std::fs::read_to_string(&csv_path).expect("Failed to read CSV");
    let mut lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.remove(0), "URL,Status");
    lines.sort();
    assert_eq!(
        lines,
        vec![format!("{}/,200", base_url), format!("{}/a,503", base_url)]
    );
}

#[tokio::test]
async fn test_run_crawl_rejects_bad_seed_and_output() {
    let result = run_crawl(create_test_config("mailto:nobody@example.com", 1, 1)).await;
    assert!(matches!(result, Err(SkimError::InvalidSeedUrl { .. })));

    let mut config = create_test_config("http://127.0.0.1:1/", 1, 1);
    config.output.csv_path = Some("/nonexistent/dir/crawl.csv".into());
    let result = run_crawl(config).await;
    assert!(matches!(result, Err(SkimError::SinkInit { .. })));
}

#[tokio::test]
async fn test_headless_without_browser_still_crawls() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", &[]).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = create_test_config(&base_url, 1, 1);
    config.headless.enabled = true;
    config.headless.chrome_path = Some("/nonexistent/chromium-binary".into());
    config.output.csv_path = Some(dir.path().join("crawl.csv"));

    let summary = run_crawl(config).await.expect("Crawl failed");
    assert_eq!(summary.observations, 1);
    assert_eq!(summary.fallback_runs, 0);
}
