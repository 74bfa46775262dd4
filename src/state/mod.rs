//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlArena`: interned URLs with their depth, referrer and state; acts as
//!   the session's visited set
//! - `UrlState` / `SkipReason`: where each URL is in the crawl
//! - `PageRecord` / `SkipRecord`: what the session hands back to callers

mod arena;
mod page_record;
mod page_state;

// Re-export main types
pub use arena::{UrlArena, UrlEntry, UrlId};
pub use page_record::{
    is_html_content_type, HeadingCounts, PageError, PageMetrics, PageRecord, RedirectStop,
    SkipRecord, UnfollowedRedirect,
};
pub use page_state::{SkipReason, UrlState};
