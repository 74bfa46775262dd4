//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and hop-by-hop redirect following
//! - HTML parsing and link extraction
//! - Session-wide rate limiting
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod rate_limit;
mod redirect;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::Crawler;
pub use fetcher::{build_http_client, FetchError, FetchResponse, Fetcher, HttpFetcher};
pub use frontier::{CrawlTask, Frontier};
pub use parser::{extract_links, parse_html, ParsedPage};
pub use rate_limit::{interval_for_rate, RateLimiter, MAX_INTERVAL};
pub use redirect::RedirectFollower;
pub use session::CrawlSession;

use crate::config::CrawlSettings;
use crate::CrawlError;

/// Crawls a site from `seed_url` with default settings for everything but
/// the four core limits
///
/// This is the main entry point for a one-off crawl. It will:
/// 1. Validate the seed and limits
/// 2. Build the HTTP client
/// 3. Fetch robots.txt for the seed origin
/// 4. Crawl breadth-first until the frontier empties or `max_pages` is hit
///
/// # Arguments
///
/// * `seed_url` - Absolute http(s) URL to start from
/// * `max_pages` - Cap on fetched pages, seed included
/// * `max_depth` - Deepest link level fetched (0 = seed only)
/// * `requests_per_second` - Session-wide request ceiling
///
/// # Returns
///
/// * `Ok(CrawlSession)` - Crawl ran; per-page failures are recorded inside
/// * `Err(CrawlError)` - Invalid input, nothing was fetched
///
/// # Example
///
/// ```no_run
/// # async fn example() -> Result<(), seo_crawler::CrawlError> {
/// let session = seo_crawler::crawl("https://example.com/", 100, 3, 2.0).await?;
/// for page in session.pages() {
///     println!("{} {:?}", page.url, page.status);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    seed_url: &str,
    max_pages: usize,
    max_depth: u32,
    requests_per_second: f64,
) -> Result<CrawlSession, CrawlError> {
    let settings = CrawlSettings::new(max_pages, max_depth, requests_per_second);
    settings.validate()?;
    Crawler::with_http_fetcher(settings)?.run(seed_url).await
}
