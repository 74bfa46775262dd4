//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The [`Fetcher`] trait the coordinator and robots module fetch through
//! - Building HTTP clients with proper user agent strings
//! - Reading `Location` targets off redirect responses
//! - Error classification
//!
//! A [`Fetcher`] issues exactly one request per call. Redirects are followed
//! hop by hop by [`RedirectFollower`](super::RedirectFollower), so that every
//! hop is rate limited and checked against the crawl scope.

use crate::config::CrawlSettings;
use crate::state::{PageError, UnfollowedRedirect};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Longest connect phase allowed, capped by the request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a fetch produced no response
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("too many redirects after {hops} hops")]
    TooManyRedirects { hops: usize },

    #[error("invalid redirect: {0}")]
    InvalidRedirect(String),
}

impl From<FetchError> for PageError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Timeout(after) => PageError::Timeout {
                after_ms: after.as_millis() as u64,
            },
            FetchError::Network(message) => PageError::Network { message },
            FetchError::TooManyRedirects { hops } => PageError::TooManyRedirects { hops },
            FetchError::InvalidRedirect(message) => PageError::Network {
                message: format!("invalid redirect: {}", message),
            },
        }
    }
}

/// One HTTP response, or the end of a followed redirect chain
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// URL that produced this response
    pub final_url: Url,

    /// HTTP status code
    pub status: u16,

    /// Response headers
    pub headers: HeaderMap,

    /// Response body; empty for content types that are not text
    pub body: String,

    /// URLs that redirected before `final_url`, in order
    pub redirect_chain: Vec<Url>,

    /// Redirect `final_url` issued that was not followed
    pub unfollowed_redirect: Option<UnfollowedRedirect>,

    /// Time from the first request to the complete body
    pub elapsed: Duration,
}

impl FetchResponse {
    /// Creates a response with a single Content-Type header
    pub fn new(final_url: Url, status: u16, content_type: &str, body: &str) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(content_type) {
            headers.insert(CONTENT_TYPE, value);
        }

        Self {
            final_url,
            status,
            headers,
            body: body.to_string(),
            redirect_chain: Vec::new(),
            unfollowed_redirect: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Creates a bodiless redirect response pointing at `location`
    pub fn redirect(from: Url, status: u16, location: &str) -> Self {
        let mut response = Self::new(from, status, "text/html", "");
        if let Ok(value) = HeaderValue::from_str(location) {
            response.headers.insert(LOCATION, value);
        }
        response
    }

    /// Returns the Content-Type header value
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns true for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Resolves the `Location` of a 3xx response against `final_url`
    ///
    /// Returns `Ok(None)` for responses that do not redirect, including 3xx
    /// responses without a `Location` header.
    pub fn redirect_target(&self) -> Result<Option<Url>, FetchError> {
        if !(300..400).contains(&self.status) {
            return Ok(None);
        }
        let Some(location) = self.headers.get(LOCATION) else {
            return Ok(None);
        };

        let location = location.to_str().map_err(|e| {
            FetchError::InvalidRedirect(format!("unreadable Location header: {}", e))
        })?;
        let target = self.final_url.join(location.trim()).map_err(|e| {
            FetchError::InvalidRedirect(format!("{} -> {}: {}", self.final_url, location, e))
        })?;
        if !crate::url::is_http(&target) {
            return Err(FetchError::InvalidRedirect(format!(
                "{} redirects to unsupported scheme {}",
                self.final_url,
                target.scheme()
            )));
        }

        Ok(Some(target))
    }
}

/// Fetch collaborator used by the crawler
///
/// Implementations issue a single request and return redirect responses
/// as they are, `Location` header included.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are disabled on the client; the crawler follows them itself.
///
/// # Example
///
/// ```no_run
/// use seo_crawler::config::CrawlSettings;
/// use seo_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlSettings::default()).unwrap();
/// ```
pub fn build_http_client(settings: &CrawlSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(settings.user_agent_header())
        .timeout(settings.request_timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(settings.request_timeout))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from session settings
    pub fn new(settings: &CrawlSettings) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(settings)?,
            timeout: settings.request_timeout,
        })
    }

    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if error.is_connect() {
            FetchError::Network(format!("connection failed: {}", error))
        } else {
            FetchError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Issues one GET request
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Any response, redirects included | `Ok(FetchResponse)` |
    /// | Timeout | `Timeout` |
    /// | Connection refused, DNS, TLS | `Network` |
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = response.status();
        let headers = response.headers().clone();

        let body = if !status.is_redirection() && should_read_body(headers.get(CONTENT_TYPE)) {
            response.text().await.map_err(|e| self.classify(e))?
        } else {
            String::new()
        };

        Ok(FetchResponse {
            final_url: url.clone(),
            status: status.as_u16(),
            headers,
            body,
            redirect_chain: Vec::new(),
            unfollowed_redirect: None,
            elapsed: started.elapsed(),
        })
    }
}

/// Text bodies are read; binary bodies (images, PDFs, ...) are not
fn should_read_body(content_type: Option<&HeaderValue>) -> bool {
    let Some(value) = content_type.and_then(|v| v.to_str().ok()) else {
        return true;
    };
    let mime = value.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    mime.starts_with("text/") || mime.ends_with("+xml") || mime.ends_with("/xml")
}
