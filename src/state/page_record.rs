//! Per-page crawl results
//!
//! A [`PageRecord`] is created once per fetched URL and never modified
//! afterwards. Failures are stored as data in [`PageError`] rather than
//! propagated, so a session can report partial success.

use super::page_state::SkipReason;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Why a fetch did not produce a usable page
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageError {
    #[error("request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("too many redirects ({hops} hops)")]
    TooManyRedirects { hops: usize },
}

impl PageError {
    /// Returns the error category: `fetch_error` or `too_many_redirects`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TooManyRedirects { .. } => "too_many_redirects",
            _ => "fetch_error",
        }
    }
}

/// Why the crawler stopped following a redirect chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectStop {
    /// The target is outside the crawled origin
    OffOrigin,

    /// robots.txt disallows the target
    RobotsDisallowed,
}

/// A redirect the crawler saw but did not request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnfollowedRedirect {
    pub target: Url,
    pub reason: RedirectStop,
}

/// Heading element counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeadingCounts {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub h4: usize,
    pub h5: usize,
    pub h6: usize,
}

/// On-page SEO facts gathered from an HTML body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetrics {
    /// Length of the title in characters (0 without a title)
    pub title_length: usize,

    /// Content of `<meta name="description">`
    pub meta_description: Option<String>,

    /// Length of the meta description in characters
    pub meta_description_length: usize,

    pub headings: HeadingCounts,

    /// Whitespace-separated words of visible text
    pub word_count: usize,

    /// `<a href>` elements, duplicates and cross-origin links included
    pub anchor_count: usize,

    /// `<img>` elements
    pub image_count: usize,
}

/// Result of fetching one URL
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    /// The normalized URL that was requested
    pub url: Url,

    /// The URL the redirect chain ended at
    pub final_url: Url,

    /// Link depth from the seed
    pub depth: u32,

    /// The page that first linked here (None for the seed)
    pub referrer: Option<Url>,

    /// HTTP status of the final response, if one was received
    pub status: Option<u16>,

    /// Content-Type header of the final response
    pub content_type: Option<String>,

    /// Page title, for HTML pages
    pub title: Option<String>,

    /// Outbound links (normalized, deduplicated, in document order),
    /// including cross-origin links
    pub links: Vec<Url>,

    /// Intermediate URLs visited before `final_url`
    pub redirect_chain: Vec<Url>,

    /// Redirect issued by `final_url` that was not followed
    pub unfollowed_redirect: Option<UnfollowedRedirect>,

    /// On-page facts, for 2xx HTML pages
    pub metrics: Option<PageMetrics>,

    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,

    /// Time from request to complete body
    pub response_time_ms: Option<u64>,

    /// Failure, if the fetch did not succeed
    pub error: Option<PageError>,
}

impl PageRecord {
    /// Creates a record for a fetch that produced no response
    pub fn failed(url: Url, depth: u32, referrer: Option<Url>, error: PageError) -> Self {
        Self {
            final_url: url.clone(),
            url,
            depth,
            referrer,
            status: None,
            content_type: None,
            title: None,
            links: Vec::new(),
            redirect_chain: Vec::new(),
            unfollowed_redirect: None,
            metrics: None,
            fetched_at: Utc::now(),
            response_time_ms: None,
            error: Some(error),
        }
    }

    /// Returns true if the page was fetched with a 2xx status
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns true if the page was redirected, followed or not
    pub fn was_redirected(&self) -> bool {
        !self.redirect_chain.is_empty() || self.unfollowed_redirect.is_some()
    }

    /// Where the redirects pointed: the unfollowed target if there is one,
    /// otherwise the final URL
    pub fn redirect_destination(&self) -> &Url {
        self.unfollowed_redirect
            .as_ref()
            .map_or(&self.final_url, |redirect| &redirect.target)
    }

    /// Number of redirects issued, the unfollowed one included
    pub fn redirect_hops(&self) -> usize {
        self.redirect_chain.len() + usize::from(self.unfollowed_redirect.is_some())
    }

    /// Returns true if the content type is HTML
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().is_some_and(is_html_content_type)
    }
}

/// A discovered URL that was never fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipRecord {
    pub url: Url,
    pub depth: u32,
    pub referrer: Option<Url>,
    pub reason: SkipReason,
}

/// Returns true for `text/html` and `application/xhtml+xml`, ignoring
/// parameters such as `charset`
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(PageError::Timeout { after_ms: 10 }.kind(), "fetch_error");
        assert_eq!(PageError::HttpStatus { status: 404 }.kind(), "fetch_error");
        assert_eq!(
            PageError::Network {
                message: "refused".to_string()
            }
            .kind(),
            "fetch_error"
        );
        assert_eq!(
            PageError::TooManyRedirects { hops: 5 }.kind(),
            "too_many_redirects"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(PageError::HttpStatus { status: 503 }.to_string(), "HTTP 503");
        assert_eq!(
            PageError::TooManyRedirects { hops: 5 }.to_string(),
            "too many redirects (5 hops)"
        );
    }

    #[test]
    fn test_error_serializes_with_kind_tag() {
        let json = serde_json::to_value(PageError::HttpStatus { status: 404 }).unwrap();
        assert_eq!(json["kind"], "http_status");
        assert_eq!(json["status"], 404);
    }

    #[test]
    fn test_failed_record() {
        let record = PageRecord::failed(
            url("https://example.com/x"),
            2,
            Some(url("https://example.com/")),
            PageError::Timeout { after_ms: 30_000 },
        );

        assert!(!record.is_success());
        assert_eq!(record.final_url, record.url);
        assert!(record.status.is_none());
        assert!(record.links.is_empty());
    }

    #[test]
    fn test_unfollowed_redirect_counts_as_redirect() {
        let mut record = PageRecord::failed(
            url("https://example.com/out"),
            1,
            None,
            PageError::HttpStatus { status: 302 },
        );
        record.error = None;
        record.status = Some(302);
        assert!(!record.was_redirected());
        assert_eq!(record.redirect_destination(), &record.final_url);

        record.unfollowed_redirect = Some(UnfollowedRedirect {
            target: url("https://other.com/landing"),
            reason: RedirectStop::OffOrigin,
        });
        assert!(record.was_redirected());
        assert_eq!(record.redirect_hops(), 1);
        assert_eq!(
            record.redirect_destination().as_str(),
            "https://other.com/landing"
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["unfollowed_redirect"]["reason"], "off_origin");
    }

    #[test]
    fn test_is_html_content_type() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("TEXT/HTML"));
        assert!(is_html_content_type("application/xhtml+xml"));

        assert!(!is_html_content_type("application/pdf"));
        assert!(!is_html_content_type("text/plain"));
        assert!(!is_html_content_type(""));
    }
}
