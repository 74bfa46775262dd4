//! In-memory site for unit tests

use crate::config::CrawlSettings;
use crate::crawler::{CrawlSession, Crawler, FetchError, FetchResponse, Fetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

#[derive(Clone)]
pub(crate) enum Route {
    Page(u16, &'static str, &'static str),
    Redirect(&'static str),
    Fail(FetchError),
    Hang,
}

/// Site keyed by absolute URL; unknown URLs are 404
///
/// Like the HTTP fetcher it answers one request per call, redirects included.
pub(crate) struct StubSite {
    routes: HashMap<String, Route>,
    hits: Mutex<Vec<String>>,
}

impl StubSite {
    pub(crate) fn new() -> Self {
        Self {
            routes: HashMap::new(),
            hits: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn html(self, url: &str, body: &'static str) -> Self {
        self.route(url, Route::Page(200, "text/html; charset=utf-8", body))
    }

    pub(crate) fn route(mut self, url: &str, route: Route) -> Self {
        self.routes.insert(url.to_string(), route);
        self
    }

    /// Every URL requested, robots.txt included
    pub(crate) fn all_hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    /// Page URLs requested, robots.txt excluded
    pub(crate) fn hits(&self) -> Vec<String> {
        self.all_hits()
            .into_iter()
            .filter(|u| !u.ends_with("/robots.txt"))
            .collect()
    }

    pub(crate) fn hit_count(&self, url: &str) -> usize {
        self.hits().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetcher for StubSite {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        self.hits.lock().unwrap().push(url.to_string());
        match self.routes.get(url.as_str()).cloned() {
            None => Ok(FetchResponse::new(url.clone(), 404, "text/html", "Not Found")),
            Some(Route::Page(status, content_type, body)) => {
                Ok(FetchResponse::new(url.clone(), status, content_type, body))
            }
            Some(Route::Redirect(to)) => Ok(FetchResponse::redirect(url.clone(), 301, to)),
            Some(Route::Fail(error)) => Err(error),
            Some(Route::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(FetchError::Network("hung".to_string()))
            }
        }
    }
}

/// Fast settings for stub crawls
pub(crate) fn settings(max_pages: usize, max_depth: u32) -> CrawlSettings {
    CrawlSettings::new(max_pages, max_depth, 1000.0)
}

pub(crate) async fn crawl_site(site: Arc<StubSite>, settings: CrawlSettings) -> CrawlSession {
    Crawler::new(settings, site)
        .run("https://example.com/")
        .await
        .unwrap()
}

/// A small finished session with one of everything a report shows
///
/// Seed links to `/about` (200), `/old` (301 to `/new`), `/missing` (404),
/// `/deep` (beyond depth 1 via `/about`), `/private` (robots disallowed) and
/// `https://other.com/` (external).
pub(crate) async fn sample_session() -> CrawlSession {
    let site = Arc::new(
        StubSite::new()
            .route(
                "https://example.com/robots.txt",
                Route::Page(
                    200,
                    "text/plain",
                    "User-agent: *\nDisallow: /private\nSitemap: https://example.com/sitemap.xml",
                ),
            )
            .html(
                "https://example.com/",
                r#"<html><head><title>Home</title></head><body>
                   <a href="/about">About</a>
                   <a href="/old">Old</a>
                   <a href="/missing">Missing</a>
                   <a href="/private">Private</a>
                   <a href="https://other.com/">Other</a>
                   </body></html>"#,
            )
            .html(
                "https://example.com/about",
                r#"<title>About</title><a href="/deep">Deep</a>"#,
            )
            .route("https://example.com/old", Route::Redirect("/new"))
            .html("https://example.com/new", "<title>New</title>"),
    );

    crawl_site(site, settings(100, 1)).await
}
