//! Markdown report generation
//!
//! This module generates human-readable markdown reports of crawl results,
//! including statistics, broken links, redirects and external links.

use crate::crawler::CrawlSession;
use crate::output::stats::CrawlStatistics;
use crate::output::traits::{OutputResult, ReportFormatter};
use crate::state::{PageRecord, SkipReason};
use std::fmt::Write;

/// Longest list printed per section
const SECTION_LIMIT: usize = 50;

/// Renders a session as a markdown report
#[derive(Debug, Clone, Default)]
pub struct MarkdownReport {
    /// SHA-256 of the configuration file, if one was used
    pub config_hash: Option<String>,
}

impl ReportFormatter for MarkdownReport {
    fn render(&self, session: &CrawlSession) -> OutputResult<String> {
        Ok(format_markdown_report(session, self.config_hash.as_deref()))
    }
}

/// Formats a crawl session as markdown
///
/// # Arguments
///
/// * `session` - The finished crawl session
/// * `config_hash` - Hash of the configuration file, shown under run information
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_report(session: &CrawlSession, config_hash: Option<&str>) -> String {
    let stats = CrawlStatistics::from_session(session);
    let mut md = String::new();

    // Writing to a String cannot fail
    let _ = write_report(&mut md, session, &stats, config_hash);
    md
}

fn write_report(
    md: &mut String,
    session: &CrawlSession,
    stats: &CrawlStatistics,
    config_hash: Option<&str>,
) -> std::fmt::Result {
    writeln!(md, "# SEO Crawl Summary\n")?;

    // Run metadata
    writeln!(md, "## Run Information\n")?;
    writeln!(md, "- **Seed**: {}", session.seed())?;
    writeln!(md, "- **Started**: {}", session.started_at().to_rfc3339())?;
    if let Some(finished) = session.finished_at() {
        writeln!(md, "- **Finished**: {}", finished.to_rfc3339())?;
    }
    if let Some(duration) = session.duration() {
        writeln!(
            md,
            "- **Duration**: {:.2} seconds",
            duration.num_milliseconds() as f64 / 1000.0
        )?;
    }
    let status = if session.is_cancelled() {
        "cancelled"
    } else {
        "completed"
    };
    writeln!(md, "- **Status**: {}", status)?;
    let settings = session.settings();
    writeln!(
        md,
        "- **Limits**: {} pages, depth {}, {} req/s",
        settings.max_pages, settings.max_depth, settings.requests_per_second
    )?;
    writeln!(
        md,
        "- **Request Interval**: {} ms",
        session.request_interval().as_millis()
    )?;
    writeln!(
        md,
        "- **robots.txt**: {}",
        if session.robots().is_some() {
            "found"
        } else {
            "none"
        }
    )?;
    if let Some(hash) = config_hash {
        writeln!(md, "- **Config Hash**: {}", hash)?;
    }
    writeln!(md)?;

    // Overall statistics
    writeln!(md, "## Overall Statistics\n")?;
    writeln!(md, "- **Pages Fetched**: {}", stats.pages_fetched)?;
    writeln!(md, "- **Succeeded**: {}", stats.pages_succeeded)?;
    writeln!(md, "- **Failed**: {}", stats.pages_failed)?;
    writeln!(md, "- **Redirected**: {}", stats.pages_redirected)?;
    writeln!(md, "- **Links Found**: {}", stats.total_links)?;
    writeln!(md, "- **External Links**: {}", stats.external_links)?;
    writeln!(md, "- **Success Rate**: {:.2}%\n", stats.success_rate())?;

    // Skip breakdown
    writeln!(md, "## Skipped URLs\n")?;
    writeln!(md, "| Reason | Count |")?;
    writeln!(md, "|--------|-------|")?;
    for reason in SkipReason::all() {
        writeln!(md, "| {} | {} |", reason, stats.skipped(reason))?;
    }
    writeln!(md)?;

    // On-page basics
    if stats.html_pages > 0 {
        writeln!(md, "## Page Content\n")?;
        writeln!(md, "- **HTML Pages**: {}", stats.html_pages)?;
        writeln!(md, "- **Missing Title**: {}", stats.missing_title)?;
        writeln!(
            md,
            "- **Missing Meta Description**: {}",
            stats.missing_meta_description
        )?;
        writeln!(md, "- **Missing H1**: {}\n", stats.missing_h1)?;
    }

    // Depth breakdown
    if !stats.depth_breakdown.is_empty() {
        writeln!(md, "## Depth Breakdown\n")?;
        writeln!(md, "| Depth | Pages |")?;
        writeln!(md, "|-------|-------|")?;
        for (depth, count) in &stats.depth_breakdown {
            writeln!(md, "| {} | {} |", depth, count)?;
        }
        writeln!(md)?;
    }

    // Status codes
    if !stats.status_breakdown.is_empty() {
        writeln!(md, "## Status Codes\n")?;
        writeln!(md, "| Status | Pages |")?;
        writeln!(md, "|--------|-------|")?;
        for (status, count) in &stats.status_breakdown {
            writeln!(md, "| {} | {} |", status, count)?;
        }
        writeln!(md)?;
    }

    // Broken links
    let broken = session.broken_links();
    if !broken.is_empty() {
        writeln!(md, "## Broken Links\n")?;
        writeln!(md, "| URL | Error | Linked From |")?;
        writeln!(md, "|-----|-------|-------------|")?;
        for page in broken.iter().take(SECTION_LIMIT) {
            writeln!(
                md,
                "| {} | {} | {} |",
                page.url,
                describe_error(page),
                page.referrer.as_ref().map_or("-", |r| r.as_str())
            )?;
        }
        write_overflow(md, broken.len())?;
    }

    // Redirects
    let redirects = session.redirects();
    if !redirects.is_empty() {
        writeln!(md, "## Redirects\n")?;
        writeln!(md, "| URL | Final URL | Hops |")?;
        writeln!(md, "|-----|-----------|------|")?;
        for page in redirects.iter().take(SECTION_LIMIT) {
            writeln!(
                md,
                "| {} | {} | {} |",
                page.url,
                page.redirect_destination(),
                page.redirect_hops()
            )?;
        }
        write_overflow(md, redirects.len())?;
    }

    // External links
    let external: Vec<_> = session.external_links().collect();
    if !external.is_empty() {
        writeln!(md, "## External Links\n")?;
        writeln!(md, "Total: {}\n", external.len())?;
        for url in external.iter().take(SECTION_LIMIT) {
            writeln!(md, "- {}", url)?;
        }
        write_overflow(md, external.len())?;
    }

    Ok(())
}

fn describe_error(page: &PageRecord) -> String {
    page.error
        .as_ref()
        .map_or_else(|| "-".to_string(), |e| e.to_string())
}

fn write_overflow(md: &mut String, total: usize) -> std::fmt::Result {
    if total > SECTION_LIMIT {
        writeln!(md, "\n... and {} more\n", total - SECTION_LIMIT)
    } else {
        writeln!(md)
    }
}
