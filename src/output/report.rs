//! Serializable session report and JSON export

use crate::crawler::CrawlSession;
use crate::output::stats::CrawlStatistics;
use crate::output::traits::{OutputResult, ReportFormatter};
use crate::state::{PageRecord, SkipRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// Limits a session ran with
#[derive(Debug, Clone, Serialize)]
pub struct SettingsReport {
    pub max_pages: usize,
    pub max_depth: u32,
    pub requests_per_second: f64,
    pub workers: usize,
    pub request_timeout_ms: u64,
    pub max_redirects: usize,
    pub user_agent: String,

    /// Spacing actually used, after any robots.txt crawl-delay
    pub request_interval_ms: u64,
}

/// robots.txt facts for the seed origin
#[derive(Debug, Clone, Serialize)]
pub struct RobotsReport {
    pub found: bool,
    pub crawl_delay: Option<f64>,
    pub sitemaps: Vec<String>,
}

/// Everything a downstream analyzer needs from one crawl
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub seed: Url,
    pub origin: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub cancelled: bool,
    pub settings: SettingsReport,
    pub robots: RobotsReport,
    pub statistics: CrawlStatistics,
    pub pages: Vec<PageRecord>,
    pub skipped: Vec<SkipRecord>,
    pub external_links: Vec<Url>,
}

impl SessionReport {
    pub fn from_session(session: &CrawlSession) -> Self {
        let settings = session.settings();
        let agent = settings.robots_agent();

        Self {
            seed: session.seed().clone(),
            origin: session.origin().to_string(),
            started_at: session.started_at(),
            finished_at: session.finished_at(),
            duration_ms: session.duration().map(|d| d.num_milliseconds()),
            cancelled: session.is_cancelled(),
            settings: SettingsReport {
                max_pages: settings.max_pages,
                max_depth: settings.max_depth,
                requests_per_second: settings.requests_per_second,
                workers: settings.workers,
                request_timeout_ms: settings.request_timeout.as_millis() as u64,
                max_redirects: settings.max_redirects,
                user_agent: settings.user_agent_header(),
                request_interval_ms: session.request_interval().as_millis() as u64,
            },
            robots: RobotsReport {
                found: session.robots().is_some(),
                crawl_delay: session.robots().and_then(|r| r.crawl_delay(agent)),
                sitemaps: session.robots().map(|r| r.sitemaps()).unwrap_or_default(),
            },
            statistics: CrawlStatistics::from_session(session),
            pages: session.pages().cloned().collect(),
            skipped: session.skipped(),
            external_links: session.external_links().cloned().collect(),
        }
    }
}

impl CrawlSession {
    /// Builds the serializable report of this session
    pub fn report(&self) -> SessionReport {
        SessionReport::from_session(self)
    }
}

/// Renders a session as a JSON [`SessionReport`]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReport {
    pub pretty: bool,
}

impl ReportFormatter for JsonReport {
    fn render(&self, session: &CrawlSession) -> OutputResult<String> {
        let report = session.report();
        let json = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        Ok(json)
    }
}
