//! URL state definitions for tracking crawl progress
//!
//! Every URL interned in a session's arena is in exactly one of these states.

use serde::Serialize;
use std::fmt;

use super::arena::UrlId;

/// Why a discovered URL was not fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// robots.txt disallows the path for our user agent
    RobotsDisallowed,

    /// Discovered one level beyond the configured maximum depth
    DepthExceeded,

    /// Still queued when the page cap was reached
    PageLimitReached,

    /// Still queued or in flight when the session was cancelled
    Cancelled,

    /// Redirected to a URL another record already owns
    RedirectDuplicate,
}

impl SkipReason {
    /// Returns the stable snake_case label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RobotsDisallowed => "robots_disallowed",
            Self::DepthExceeded => "depth_exceeded",
            Self::PageLimitReached => "page_limit_reached",
            Self::Cancelled => "cancelled",
            Self::RedirectDuplicate => "redirect_duplicate",
        }
    }

    /// Returns all skip reasons in report order
    pub fn all() -> [Self; 5] {
        [
            Self::RobotsDisallowed,
            Self::DepthExceeded,
            Self::PageLimitReached,
            Self::Cancelled,
            Self::RedirectDuplicate,
        ]
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the current state of a URL in the crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlState {
    // ===== Active States =====
    /// Waiting in the frontier
    Queued,

    /// Handed to a worker
    Fetching,

    // ===== Terminal States =====
    /// Fetched; a page record exists for this URL
    Fetched,

    /// Reached as the final URL of a redirect from another entry, whose
    /// record covers it
    Alias(UrlId),

    /// Never fetched
    Skipped(SkipReason),
}

impl UrlState {
    /// Returns true if a record already owns this URL as its identity
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Fetching | Self::Fetched | Self::Alias(_))
    }

    /// Returns the skip reason, if this URL was skipped
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => f.write_str("queued"),
            Self::Fetching => f.write_str("fetching"),
            Self::Fetched => f.write_str("fetched"),
            Self::Alias(_) => f.write_str("alias"),
            Self::Skipped(reason) => write!(f, "skipped:{}", reason),
        }
    }
}
