use crate::config::types::{Config, UserAgentConfig};
use crate::crawler::interval_for_rate;
use crate::CrawlError;
use std::time::Duration;

/// Upper bound on the worker pool
pub const MAX_WORKERS: usize = 100;

/// Slowest accepted request rate: one request per day
pub const MIN_REQUESTS_PER_SECOND: f64 = 1.0 / 86_400.0;

/// Runtime parameters of one crawl session
///
/// Built from a [`Config`] or directly from the four core limits. Unlike
/// the file configuration, a `CrawlSettings` is checked at the start of
/// every crawl and rejected with [`CrawlError::InvalidInput`].
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Cap on fetched pages, seed included
    pub max_pages: usize,

    /// Deepest link level that is fetched (0 = seed only)
    pub max_depth: u32,

    /// Session-wide request ceiling
    pub requests_per_second: f64,

    /// Number of concurrent fetch workers
    pub workers: usize,

    /// Upper bound on a single request; each redirect hop gets its own
    pub request_timeout: Duration,

    /// Redirect hops followed before a fetch fails
    pub max_redirects: usize,

    /// Identification sent with every request
    pub user_agent: UserAgentConfig,
}

impl CrawlSettings {
    /// Creates settings with the given limits and default everything else
    pub fn new(max_pages: usize, max_depth: u32, requests_per_second: f64) -> Self {
        Self {
            max_pages,
            max_depth,
            requests_per_second,
            ..Self::default()
        }
    }

    /// Checks the limits, returning `InvalidInput` for the first bad one
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.max_pages == 0 {
            return Err(CrawlError::InvalidInput(
                "max_pages must be a positive integer".to_string(),
            ));
        }

        if !self.requests_per_second.is_finite()
            || self.requests_per_second < MIN_REQUESTS_PER_SECOND
        {
            return Err(CrawlError::InvalidInput(format!(
                "requests_per_second must be a finite number of at least one request per day, got {}",
                self.requests_per_second
            )));
        }

        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(CrawlError::InvalidInput(format!(
                "workers must be between 1 and {}, got {}",
                MAX_WORKERS, self.workers
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(CrawlError::InvalidInput(
                "request_timeout must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Minimum spacing between two requests of this session
    pub fn request_interval(&self) -> Duration {
        interval_for_rate(self.requests_per_second)
    }

    /// The User-Agent header value
    pub fn user_agent_header(&self) -> String {
        self.user_agent.header_value()
    }

    /// The product token matched against robots.txt user-agent groups
    pub fn robots_agent(&self) -> &str {
        &self.user_agent.crawler_name
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Config::default().settings()
    }
}

impl Config {
    /// Converts the file configuration into session settings
    pub fn settings(&self) -> CrawlSettings {
        CrawlSettings {
            max_pages: self.crawler.max_pages,
            max_depth: self.crawler.max_depth,
            requests_per_second: self.crawler.requests_per_second,
            workers: self.crawler.workers,
            request_timeout: Duration::from_secs(self.crawler.request_timeout),
            max_redirects: self.crawler.max_redirects,
            user_agent: self.user_agent.clone(),
        }
    }
}
