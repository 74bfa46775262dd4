//! Statistics generation from a crawl session
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from a finished [`CrawlSession`].

use crate::crawler::CrawlSession;
use crate::state::SkipReason;
use serde::Serialize;
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlStatistics {
    /// Number of page records
    pub pages_fetched: u64,

    /// Pages fetched with a 2xx status
    pub pages_succeeded: u64,

    /// Pages with a network error, timeout, redirect failure or non-2xx status
    pub pages_failed: u64,

    /// Pages reached through at least one redirect
    pub pages_redirected: u64,

    /// Discovered URLs that were never fetched
    pub urls_skipped: u64,

    /// Skipped URL count per reason
    pub skipped_by_reason: BTreeMap<SkipReason, u64>,

    /// Distinct cross-origin links
    pub external_links: u64,

    /// Outbound links across all pages, duplicates between pages included
    pub total_links: u64,

    /// Pages per depth
    pub depth_breakdown: BTreeMap<u32, u64>,

    /// Pages per final HTTP status
    pub status_breakdown: BTreeMap<u16, u64>,

    /// 2xx HTML pages, the ones with on-page metrics
    pub html_pages: u64,

    /// HTML pages without a `<title>`
    pub missing_title: u64,

    /// HTML pages without a meta description
    pub missing_meta_description: u64,

    /// HTML pages without an `<h1>`
    pub missing_h1: u64,
}

impl CrawlStatistics {
    /// Tallies a session
    pub fn from_session(session: &CrawlSession) -> Self {
        let mut stats = Self::default();

        for page in session.pages() {
            stats.pages_fetched += 1;
            if page.is_success() {
                stats.pages_succeeded += 1;
            } else {
                stats.pages_failed += 1;
            }
            if page.was_redirected() {
                stats.pages_redirected += 1;
            }
            stats.total_links += page.links.len() as u64;
            *stats.depth_breakdown.entry(page.depth).or_insert(0) += 1;
            if let Some(status) = page.status {
                *stats.status_breakdown.entry(status).or_insert(0) += 1;
            }
            if let Some(metrics) = &page.metrics {
                stats.html_pages += 1;
                if page.title.is_none() {
                    stats.missing_title += 1;
                }
                if metrics.meta_description.is_none() {
                    stats.missing_meta_description += 1;
                }
                if metrics.headings.h1 == 0 {
                    stats.missing_h1 += 1;
                }
            }
        }

        for skip in session.skipped() {
            stats.urls_skipped += 1;
            *stats.skipped_by_reason.entry(skip.reason).or_insert(0) += 1;
        }

        stats.external_links = session.external_links().count() as u64;
        stats
    }

    /// Number of skips recorded for `reason`
    pub fn skipped(&self, reason: SkipReason) -> u64 {
        self.skipped_by_reason.get(&reason).copied().unwrap_or(0)
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.pages_fetched == 0 {
            return 0.0;
        }
        (self.pages_succeeded as f64 / self.pages_fetched as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Succeeded: {}", stats.pages_succeeded);
    println!("  Failed: {}", stats.pages_failed);
    println!("  Redirected: {}", stats.pages_redirected);
    println!("  Links found: {}", stats.total_links);
    println!("  External links: {}", stats.external_links);
    println!();

    if stats.urls_skipped > 0 {
        println!("Skipped URLs ({}):", stats.urls_skipped);
        for reason in SkipReason::all() {
            let count = stats.skipped(reason);
            if count > 0 {
                println!("  {}: {}", reason, count);
            }
        }
        println!();
    }

    if stats.html_pages > 0 {
        println!("Page Content ({} HTML pages):", stats.html_pages);
        println!("  Missing title: {}", stats.missing_title);
        println!("  Missing meta description: {}", stats.missing_meta_description);
        println!("  Missing h1: {}", stats.missing_h1);
        println!();
    }

    if !stats.status_breakdown.is_empty() {
        println!("Status Codes:");
        for (status, count) in &stats.status_breakdown {
            println!("  {}: {}", status, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages fetched successfully)",
        stats.success_rate(),
        stats.pages_succeeded,
        stats.pages_fetched
    );
}
