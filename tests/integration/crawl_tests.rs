//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end through the reqwest fetcher.

use seo_crawler::config::{parse_config, CrawlSettings};
use seo_crawler::output::{write_report, OutputFormat};
use seo_crawler::state::{RedirectStop, UrlState};
use seo_crawler::{crawl, CrawlError, Crawler, PageError, SkipReason};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fast settings for a local mock server
fn test_settings(max_pages: usize, max_depth: u32) -> CrawlSettings {
    CrawlSettings::new(max_pages, max_depth, 50.0)
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body.into(), "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page_path: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_redirect(server: &MockServer, from: &str, to: &str) {
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(302).insert_header("location", to))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="/page2/">Page 2 again</a>
            <a href="https://external.example.org/">Elsewhere</a>
            </body></html>"#,
            base_url
        ),
    )
    .await;
    mount_page(
        &server,
        "/page1",
        r#"<html><head><title>Page 1</title></head><body><a href="/">Home</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/page2",
        r#"<html><head><title>Page 2</title></head><body><a href="/page1">Page 1</a></body></html>"#,
    )
    .await;

    let session = Crawler::with_http_fetcher(test_settings(100, 3))
        .unwrap()
        .run(&format!("{}/", base_url))
        .await
        .unwrap();

    assert_eq!(session.page_count(), 3);
    assert!(session.pages().all(|page| page.is_success()));

    let home = session.page(&format!("{}/", base_url)).unwrap();
    assert_eq!(home.title.as_deref(), Some("Home"));
    assert_eq!(home.status, Some(200));
    assert_eq!(home.links.len(), 3);
    assert!(home.referrer.is_none());

    let page2 = session.page(&format!("{}/page2", base_url)).unwrap();
    assert_eq!(page2.depth, 1);
    assert_eq!(page2.title.as_deref(), Some("Page 2"));

    let external: Vec<String> = session.external_links().map(|u| u.to_string()).collect();
    assert_eq!(external, vec!["https://external.example.org/".to_string()]);
    assert!(!session.is_cancelled());
}

#[tokio::test]
async fn test_respects_robots_disallow() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/",
        r#"<a href="/public">Public</a><a href="/private/data">Private</a>"#,
    )
    .await;
    mount_page(&server, "/public", "<p>public</p>").await;

    Mock::given(method("GET"))
        .and(path("/private/data"))
        .respond_with(html("<p>secret</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let session = Crawler::with_http_fetcher(test_settings(100, 3))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(session.page_count(), 2);
    let disallowed = session.skipped_for(SkipReason::RobotsDisallowed);
    assert_eq!(disallowed.len(), 1);
    assert!(disallowed[0].url.path().starts_with("/private"));
}

#[tokio::test]
async fn test_missing_robots_means_no_restrictions() {
    let server = MockServer::start().await;

    // robots.txt is unmatched and answered with 404
    mount_page(&server, "/", r#"<a href="/admin">Admin</a>"#).await;
    mount_page(&server, "/admin", "<p>admin</p>").await;

    let session = Crawler::with_http_fetcher(test_settings(100, 3))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert!(session.robots().is_none());
    assert_eq!(session.page_count(), 2);
}

#[tokio::test]
async fn test_broken_link_recorded() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/error">Error</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let seed = format!("{}/", server.uri());
    let session = Crawler::with_http_fetcher(test_settings(100, 3))
        .unwrap()
        .run(&seed)
        .await
        .unwrap();

    assert_eq!(session.page_count(), 3);
    let broken = session.broken_links();
    assert_eq!(broken.len(), 2);

    let missing = session.page(&format!("{}/missing", server.uri())).unwrap();
    assert_eq!(missing.status, Some(404));
    assert_eq!(missing.error, Some(PageError::HttpStatus { status: 404 }));
    assert_eq!(missing.referrer.as_ref().unwrap().as_str(), seed);

    let error = session.page(&format!("{}/error", server.uri())).unwrap();
    assert_eq!(error.error.as_ref().unwrap().kind(), "fetch_error");
}

#[tokio::test]
async fn test_redirect_followed() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/old">Old</a>"#).await;
    mount_redirect(&server, "/old", "/new").await;
    mount_page(&server, "/new", "<title>New</title>").await;

    let session = Crawler::with_http_fetcher(test_settings(100, 3))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(session.page_count(), 2);
    let old = session.page(&format!("{}/old", server.uri())).unwrap();
    assert_eq!(old.final_url.path(), "/new");
    assert_eq!(old.status, Some(200));
    assert_eq!(old.title.as_deref(), Some("New"));
    assert_eq!(old.redirect_chain.len(), 1);
    assert_eq!(session.redirects().len(), 1);

    // The final URL resolves to the same record
    let new = session.page(&format!("{}/new", server.uri())).unwrap();
    assert_eq!(new.url, old.url);
}

#[tokio::test]
async fn test_self_redirect_fails_with_too_many_redirects() {
    let server = MockServer::start().await;
    mount_redirect(&server, "/", "/").await;

    let session = Crawler::with_http_fetcher(test_settings(100, 3))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(session.page_count(), 1);
    let seed = session.pages().next().unwrap();
    assert_eq!(seed.error, Some(PageError::TooManyRedirects { hops: 1 }));
    assert!(!session.is_cancelled());
}

#[tokio::test]
async fn test_redirect_loop_fails_only_that_page() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/loop-a">Loop</a><a href="/fine">Fine</a>"#).await;
    mount_redirect(&server, "/loop-a", "/loop-b").await;
    mount_redirect(&server, "/loop-b", "/loop-a").await;
    mount_page(&server, "/fine", "<p>fine</p>").await;

    let session = Crawler::with_http_fetcher(test_settings(100, 3))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(session.page_count(), 3);
    let looped = session.page(&format!("{}/loop-a", server.uri())).unwrap();
    assert_eq!(looped.error, Some(PageError::TooManyRedirects { hops: 2 }));
    assert!(session.page(&format!("{}/fine", server.uri())).unwrap().is_success());
}

#[tokio::test]
async fn test_redirect_hops_wait_for_the_rate_limit() {
    let server = MockServer::start().await;

    mount_redirect(&server, "/", "/a").await;
    mount_redirect(&server, "/a", "/b").await;
    mount_redirect(&server, "/b", "/c").await;
    mount_page(&server, "/c", "<title>C</title>").await;

    let started = Instant::now();
    let session = Crawler::with_http_fetcher(CrawlSettings::new(10, 1, 5.0))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    // robots.txt plus four hops, 200ms apart
    assert!(started.elapsed() >= Duration::from_millis(780));
    assert_eq!(server.received_requests().await.unwrap().len(), 5);

    let seed = session.pages().next().unwrap();
    assert_eq!(seed.final_url.path(), "/c");
    assert_eq!(seed.redirect_hops(), 3);
}

#[tokio::test]
async fn test_redirect_to_disallowed_path_not_fetched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/", r#"<a href="/go">Go</a>"#).await;
    mount_redirect(&server, "/go", "/private/data").await;
    Mock::given(method("GET"))
        .and(path("/private/data"))
        .respond_with(html("<p>secret</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let session = Crawler::with_http_fetcher(test_settings(100, 3))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(session.page_count(), 2);
    let go = session.page(&format!("{}/go", server.uri())).unwrap();
    assert_eq!(go.status, Some(302));
    assert!(go.error.is_none());
    assert_eq!(
        go.unfollowed_redirect.as_ref().unwrap().reason,
        RedirectStop::RobotsDisallowed
    );
    assert_eq!(
        session.url_state(&format!("{}/private/data", server.uri())),
        Some(UrlState::Skipped(SkipReason::RobotsDisallowed))
    );
}

#[tokio::test]
async fn test_off_origin_redirect_not_followed() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/out">Out</a>"#).await;
    mount_redirect(&server, "/out", &format!("{}/landing", elsewhere.uri())).await;
    Mock::given(method("GET"))
        .respond_with(html("<p>elsewhere</p>"))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let session = Crawler::with_http_fetcher(test_settings(100, 3))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(session.page_count(), 2);
    let out = session.page(&format!("{}/out", server.uri())).unwrap();
    assert_eq!(out.final_url.path(), "/out");
    assert!(out.error.is_none());
    let unfollowed = out.unfollowed_redirect.as_ref().unwrap();
    assert_eq!(unfollowed.reason, RedirectStop::OffOrigin);
    assert_eq!(unfollowed.target.as_str(), format!("{}/landing", elsewhere.uri()));

    let external: Vec<String> = session.external_links().map(|u| u.to_string()).collect();
    assert_eq!(external, vec![format!("{}/landing", elsewhere.uri())]);
    assert!(session.page(&format!("{}/landing", elsewhere.uri())).is_none());
}

#[tokio::test]
async fn test_enormous_crawl_delay_does_not_abort() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 1e30\nDisallow: /"),
        )
        .mount(&server)
        .await;

    let session = Crawler::with_http_fetcher(test_settings(10, 1))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(session.request_interval(), Duration::from_secs(60));
    assert_eq!(session.page_count(), 0);
}

#[tokio::test]
async fn test_page_metrics_in_report() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Widgets</title>
        <meta name="description" content="All about widgets."></head>
        <body><h1>Widgets</h1><h2>Small</h2><p>Three more words</p>
        <img src="/w.png"></body></html>"#,
    )
    .await;

    let session = Crawler::with_http_fetcher(test_settings(10, 0))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    let metrics = session.pages().next().unwrap().metrics.clone().unwrap();
    assert_eq!(metrics.title_length, 7);
    assert_eq!(metrics.meta_description.as_deref(), Some("All about widgets."));
    assert_eq!(metrics.headings.h1, 1);
    assert_eq!(metrics.headings.h2, 1);
    assert_eq!(metrics.image_count, 1);
    assert_eq!(metrics.anchor_count, 0);
}

#[tokio::test]
async fn test_page_cap_records_remaining_links() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/p1">1</a><a href="/p2">2</a><a href="/p3">3</a>
           <a href="/p4">4</a><a href="/p5">5</a>"#,
    )
    .await;
    for page in ["/p1", "/p2", "/p3", "/p4", "/p5"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html("<p>leaf</p>"))
            .mount(&server)
            .await;
    }

    let session = Crawler::with_http_fetcher(test_settings(3, 1))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(session.page_count(), 3);
    assert_eq!(session.skipped_for(SkipReason::PageLimitReached).len(), 3);

    let requests = server.received_requests().await.unwrap();
    let page_requests = requests
        .iter()
        .filter(|r| r.url.path() != "/robots.txt")
        .count();
    assert_eq!(page_requests, 3);
}

#[tokio::test]
async fn test_depth_limit() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/level1">1</a>"#).await;
    mount_page(&server, "/level1", r#"<a href="/level2">2</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(html("<p>too deep</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let session = Crawler::with_http_fetcher(test_settings(100, 1))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(session.page_count(), 2);
    assert!(session.pages().all(|page| page.depth <= 1));
    assert_eq!(session.skipped_for(SkipReason::DepthExceeded).len(), 1);
}

#[tokio::test]
async fn test_non_html_recorded_not_parsed() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/report.pdf">Report</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.4 <a href=\"/hidden\">".to_vec())
                .insert_header("content-type", "application/pdf"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html("<p>hidden</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let session = Crawler::with_http_fetcher(test_settings(100, 3))
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    let pdf = session.page(&format!("{}/report.pdf", server.uri())).unwrap();
    assert_eq!(pdf.content_type.as_deref(), Some("application/pdf"));
    assert!(pdf.links.is_empty());
    assert!(!pdf.is_html());
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let settings = CrawlSettings {
        request_timeout: Duration::from_millis(300),
        ..test_settings(10, 1)
    };
    let session = Crawler::with_http_fetcher(settings)
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    let seed = session.pages().next().unwrap();
    assert_eq!(seed.error, Some(PageError::Timeout { after_ms: 300 }));
    assert!(seed.status.is_none());
}

#[tokio::test]
async fn test_config_user_agent_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "AuditBot/2.1 (+https://example.com/bot)"))
        .respond_with(html("<p>hello</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let config = parse_config(
        r#"
[crawler]
max-pages = 5
max-depth = 1
requests-per-second = 50

[user-agent]
crawler-name = "AuditBot"
crawler-version = "2.1"
contact-url = "https://example.com/bot"
"#,
    )
    .unwrap();

    let session = Crawler::with_http_fetcher(config.settings())
        .unwrap()
        .run(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert!(session.pages().next().unwrap().is_success());
}

#[tokio::test]
async fn test_crawl_entry_point_and_report() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/about">About</a>"#).await;
    mount_page(&server, "/about", "<title>About</title>").await;

    let session = crawl(&format!("{}/", server.uri()), 10, 2, 50.0)
        .await
        .unwrap();
    assert_eq!(session.page_count(), 2);

    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("report.json");
    write_report(&session, OutputFormat::Json, Some(&report_path), None).unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["pages"].as_array().unwrap().len(), 2);
    assert_eq!(report["cancelled"], false);
}

#[tokio::test]
async fn test_invalid_input_rejected_before_fetching() {
    assert!(matches!(
        crawl("mailto:someone@example.com", 10, 2, 1.0).await,
        Err(CrawlError::InvalidInput(_))
    ));
    assert!(matches!(
        crawl("/relative/path", 10, 2, 1.0).await,
        Err(CrawlError::InvalidInput(_))
    ));
    assert!(matches!(
        crawl("https://example.com/", 0, 2, 1.0).await,
        Err(CrawlError::InvalidInput(_))
    ));
    assert!(matches!(
        crawl("https://example.com/", 10, 2, f64::NAN).await,
        Err(CrawlError::InvalidInput(_))
    ));
    assert!(matches!(
        crawl("https://example.com/", 10, 2, 1e-20).await,
        Err(CrawlError::InvalidInput(_))
    ));
}
