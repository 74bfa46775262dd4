//! The result of one crawl
//!
//! A [`CrawlSession`] is created per crawl, filled in by the coordinator and
//! handed to the caller once the crawl ends. Nothing in it is shared with
//! other sessions.

use crate::config::CrawlSettings;
use crate::robots::RobotsPolicy;
use crate::state::{PageRecord, SkipReason, SkipRecord, UrlArena, UrlId, UrlState};
use crate::url::{normalize_url, Origin};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::time::Duration;
use url::Url;

/// Pages, skips and external links discovered from one seed
#[derive(Debug)]
pub struct CrawlSession {
    pub(super) seed: Url,
    pub(super) origin: Origin,
    pub(super) settings: CrawlSettings,
    pub(super) arena: UrlArena,
    /// Page records indexed by the arena ID of the requested URL
    pub(super) records: Vec<Option<PageRecord>>,
    pub(super) external_links: BTreeSet<Url>,
    pub(super) robots: Option<RobotsPolicy>,
    pub(super) request_interval: Duration,
    pub(super) started_at: DateTime<Utc>,
    pub(super) finished_at: Option<DateTime<Utc>>,
    pub(super) cancelled: bool,
}

impl CrawlSession {
    pub(super) fn new(seed: Url, origin: Origin, settings: CrawlSettings) -> Self {
        let request_interval = settings.request_interval();
        Self {
            seed,
            origin,
            settings,
            arena: UrlArena::new(),
            records: Vec::new(),
            external_links: BTreeSet::new(),
            robots: None,
            request_interval,
            started_at: Utc::now(),
            finished_at: None,
            cancelled: false,
        }
    }

    pub(super) fn store_record(&mut self, id: UrlId, record: PageRecord) {
        if self.records.len() <= id.index() {
            self.records.resize_with(id.index() + 1, || None);
        }
        self.records[id.index()] = Some(record);
    }

    /// The normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// The origin the crawl was confined to
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The settings the session ran with
    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Fetched pages in discovery order
    pub fn pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.records.iter().flatten()
    }

    /// Number of page records
    pub fn page_count(&self) -> usize {
        self.pages().count()
    }

    /// Looks up the record covering a URL
    ///
    /// The URL is normalized first. The final URL of a redirect resolves to
    /// the record of the URL that was requested.
    pub fn page(&self, url: &str) -> Option<&PageRecord> {
        let url = normalize_url(url).ok()?;
        let mut id = self.arena.lookup(&url)?;
        if let UrlState::Alias(owner) = self.arena.state(id) {
            id = owner;
        }
        self.records.get(id.index())?.as_ref()
    }

    /// Current state of a URL, if the session has seen it
    pub fn url_state(&self, url: &str) -> Option<UrlState> {
        let url = normalize_url(url).ok()?;
        self.arena.lookup(&url).map(|id| self.arena.state(id))
    }

    /// Every URL that was discovered but never fetched
    pub fn skipped(&self) -> Vec<SkipRecord> {
        self.arena
            .iter()
            .filter_map(|(id, entry)| {
                entry.state.skip_reason().map(|reason| SkipRecord {
                    url: entry.url.clone(),
                    depth: entry.depth,
                    referrer: self.arena.referrer_url(id).cloned(),
                    reason,
                })
            })
            .collect()
    }

    /// Skipped URLs with one particular reason
    pub fn skipped_for(&self, reason: SkipReason) -> Vec<SkipRecord> {
        self.skipped()
            .into_iter()
            .filter(|skip| skip.reason == reason)
            .collect()
    }

    /// Cross-origin links found on fetched pages, sorted
    pub fn external_links(&self) -> impl Iterator<Item = &Url> {
        self.external_links.iter()
    }

    /// Pages whose fetch failed or returned a non-2xx status
    pub fn broken_links(&self) -> Vec<&PageRecord> {
        self.pages().filter(|page| page.error.is_some()).collect()
    }

    /// Pages that were reached through at least one redirect
    pub fn redirects(&self) -> Vec<&PageRecord> {
        self.pages().filter(|page| page.was_redirected()).collect()
    }

    /// The robots.txt policy in force, if the origin served one
    pub fn robots(&self) -> Option<&RobotsPolicy> {
        self.robots.as_ref()
    }

    /// Effective spacing between requests, after any robots.txt crawl-delay
    pub fn request_interval(&self) -> Duration {
        self.request_interval
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Wall-clock duration of the crawl, if it has finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }

    /// Returns true if the crawl was cancelled before it completed
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
