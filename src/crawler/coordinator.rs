//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator task owns the session: the URL arena, the frontier and
//! every page record. It hands tasks to a fixed pool of fetch workers over a
//! bounded channel and applies their results one at a time, so the visited
//! check and insertion happen in a single place.
//!
//! Workers only fetch. They go through a [`RedirectFollower`] confined to the
//! seed origin, which waits on the shared [`RateLimiter`] and applies the
//! request timeout before every request, redirect hops included.

use crate::config::CrawlSettings;
use crate::crawler::fetcher::{FetchResponse, Fetcher, HttpFetcher};
use crate::crawler::frontier::{CrawlTask, Frontier};
use crate::crawler::parser::parse_html;
use crate::crawler::rate_limit::RateLimiter;
use crate::crawler::redirect::RedirectFollower;
use crate::crawler::session::CrawlSession;
use crate::robots::{fetch_robots, RobotsPolicy};
use crate::state::{
    is_html_content_type, PageError, PageRecord, RedirectStop, SkipReason, UnfollowedRedirect,
    UrlId, UrlState,
};
use crate::url::{normalize, validate_seed, Origin};
use crate::CrawlError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Longest crawl-delay honored from robots.txt
const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// What a worker hands back for one task
#[derive(Debug)]
struct FetchOutcome {
    task: CrawlTask,
    result: Result<FetchResponse, PageError>,
    fetched_at: DateTime<Utc>,
}

/// Breadth-first crawler for a single origin
///
/// # Example
///
/// ```no_run
/// use seo_crawler::{CrawlSettings, Crawler};
///
/// # async fn example() -> Result<(), seo_crawler::CrawlError> {
/// let crawler = Crawler::with_http_fetcher(CrawlSettings::new(50, 2, 2.0))?;
/// let session = crawler.run("https://example.com/").await?;
/// println!("{} pages", session.page_count());
/// # Ok(())
/// # }
/// ```
pub struct Crawler {
    settings: CrawlSettings,
    fetcher: Arc<dyn Fetcher>,
}

impl Crawler {
    /// Creates a crawler that fetches through `fetcher`
    pub fn new(settings: CrawlSettings, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { settings, fetcher }
    }

    /// Creates a crawler backed by a reqwest client built from `settings`
    pub fn with_http_fetcher(settings: CrawlSettings) -> Result<Self, CrawlError> {
        let fetcher = HttpFetcher::new(&settings)?;
        Ok(Self::new(settings, Arc::new(fetcher)))
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Crawls from `seed` until the frontier empties or the page cap is hit
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSession)` - the crawl ran; per-page failures are inside
    /// * `Err(CrawlError::InvalidInput)` - bad seed or settings, nothing was fetched
    pub async fn run(&self, seed: &str) -> Result<CrawlSession, CrawlError> {
        self.run_with_cancellation(seed, CancellationToken::new())
            .await
    }

    /// Like [`Crawler::run`], stopping early once `cancel` fires
    ///
    /// A cancelled crawl still returns `Ok`: tasks that were in flight or
    /// queued are recorded as skipped with [`SkipReason::Cancelled`] and the
    /// session is flagged as cancelled.
    pub async fn run_with_cancellation(
        &self,
        seed: &str,
        cancel: CancellationToken,
    ) -> Result<CrawlSession, CrawlError> {
        self.settings.validate()?;
        let seed = validate_seed(seed)?;
        let origin = Origin::of(&seed)?;

        tracing::info!(
            "Starting crawl of {} (max {} pages, depth {}, {} req/s, {} workers)",
            seed,
            self.settings.max_pages,
            self.settings.max_depth,
            self.settings.requests_per_second,
            self.settings.workers
        );

        let limiter = Arc::new(RateLimiter::new(self.settings.request_interval()));
        let mut session = CrawlSession::new(seed.clone(), origin, self.settings.clone());

        session.robots = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            policy = self.load_robots(&session.origin, limiter.clone()) => policy,
        };
        session.request_interval = limiter.interval();

        let mut frontier = Frontier::new();
        if let Ok(id) = session.arena.insert(seed.clone(), 0, None, UrlState::Queued) {
            frontier.push(CrawlTask {
                id,
                url: seed,
                depth: 0,
                referrer: None,
            });
        }

        self.drive(&mut session, &mut frontier, limiter, &cancel)
            .await;

        session.finished_at = Some(Utc::now());
        tracing::info!(
            "Crawl {}: {} pages fetched, {} skipped, {} external links",
            if session.cancelled { "cancelled" } else { "completed" },
            session.page_count(),
            session.skipped().len(),
            session.external_links.len()
        );

        Ok(session)
    }

    /// Fetches robots.txt once and applies its crawl-delay to the limiter
    ///
    /// robots.txt redirects are followed anywhere, as long as each hop is
    /// rate limited like every other request.
    async fn load_robots(
        &self,
        origin: &Origin,
        limiter: Arc<RateLimiter>,
    ) -> Option<RobotsPolicy> {
        let follower = RedirectFollower::new(
            self.fetcher.clone(),
            limiter.clone(),
            self.settings.max_redirects,
            self.settings.request_timeout,
        );
        let policy = fetch_robots(&follower, origin).await?;

        if let Some(delay) = policy.crawl_delay(self.settings.robots_agent()) {
            if let Some(delay) = crawl_delay_interval(delay) {
                if limiter.tighten(delay) {
                    tracing::info!("Honoring robots.txt crawl-delay of {:?} for {}", delay, origin);
                }
            }
        }

        Some(policy)
    }

    /// Runs the dispatch loop until the crawl ends or is cancelled
    async fn drive(
        &self,
        session: &mut CrawlSession,
        frontier: &mut Frontier,
        limiter: Arc<RateLimiter>,
        cancel: &CancellationToken,
    ) {
        let worker_count = self.settings.workers;
        let (task_tx, task_rx) = mpsc::channel::<CrawlTask>(worker_count);
        let (result_tx, mut result_rx) = mpsc::channel::<FetchOutcome>(worker_count);
        let task_rx = Arc::new(Mutex::new(task_rx));
        let follower: Arc<dyn Fetcher> = Arc::new(
            RedirectFollower::new(
                self.fetcher.clone(),
                limiter,
                self.settings.max_redirects,
                self.settings.request_timeout,
            )
            .confined_to(
                session.origin.clone(),
                session.robots.clone(),
                self.settings.robots_agent(),
            ),
        );

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            workers.spawn(fetch_worker(
                worker_id,
                task_rx.clone(),
                result_tx.clone(),
                follower.clone(),
            ));
        }
        drop(result_tx);

        let started = Instant::now();
        let mut dispatched = 0usize;
        let mut in_flight = 0usize;
        let mut completed = 0usize;

        'crawl: loop {
            if cancel.is_cancelled() {
                session.cancelled = true;
                break;
            }

            while in_flight < worker_count && dispatched < self.settings.max_pages {
                let Some(task) = frontier.pop() else {
                    break;
                };

                // Aliased or already skipped while waiting
                if session.arena.state(task.id) != UrlState::Queued {
                    continue;
                }

                if let Some(robots) = &session.robots {
                    if !robots.is_allowed(&task.url, self.settings.robots_agent()) {
                        tracing::debug!("{} disallowed by robots.txt", task.url);
                        session
                            .arena
                            .set_state(task.id, UrlState::Skipped(SkipReason::RobotsDisallowed));
                        continue;
                    }
                }

                session.arena.set_state(task.id, UrlState::Fetching);
                if let Err(mpsc::error::SendError(task)) = task_tx.send(task).await {
                    tracing::warn!("Fetch workers stopped unexpectedly");
                    session
                        .arena
                        .set_state(task.id, UrlState::Skipped(SkipReason::Cancelled));
                    break 'crawl;
                }
                in_flight += 1;
                dispatched += 1;
            }

            if in_flight == 0 {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    session.cancelled = true;
                    break;
                }
                outcome = result_rx.recv() => {
                    let Some(outcome) = outcome else {
                        tracing::warn!("Fetch workers stopped unexpectedly");
                        break;
                    };
                    in_flight -= 1;
                    completed += 1;
                    self.record_outcome(session, frontier, outcome);

                    if completed % 10 == 0 {
                        let rate = completed as f64 / started.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                            completed,
                            frontier.len(),
                            rate
                        );
                    }
                }
            }
        }

        drop(task_tx);
        if session.cancelled {
            tracing::info!("Crawl cancelled, abandoning {} in-flight fetches", in_flight);
            workers.shutdown().await;
        } else {
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    tracing::warn!("Fetch worker failed: {}", e);
                }
            }
        }

        let abandoned: Vec<UrlId> = session
            .arena
            .iter()
            .filter(|(_, entry)| entry.state == UrlState::Fetching)
            .map(|(id, _)| id)
            .collect();
        for id in abandoned {
            session
                .arena
                .set_state(id, UrlState::Skipped(SkipReason::Cancelled));
        }

        let leftover = if session.cancelled {
            SkipReason::Cancelled
        } else {
            SkipReason::PageLimitReached
        };
        for task in frontier.drain() {
            if session.arena.state(task.id) == UrlState::Queued {
                session.arena.set_state(task.id, UrlState::Skipped(leftover));
            }
        }
    }

    /// Turns a worker outcome into a page record and enqueues new links
    fn record_outcome(
        &self,
        session: &mut CrawlSession,
        frontier: &mut Frontier,
        outcome: FetchOutcome,
    ) {
        let FetchOutcome {
            task,
            result,
            fetched_at,
        } = outcome;
        let referrer = session.arena.referrer_url(task.id).cloned();

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!("Failed to fetch {}: {}", task.url, error);
                let mut record = PageRecord::failed(task.url.clone(), task.depth, referrer, error);
                record.fetched_at = fetched_at;
                session.arena.set_state(task.id, UrlState::Fetched);
                session.store_record(task.id, record);
                return;
            }
        };

        let final_url = normalize(&response.final_url).unwrap_or_else(|_| response.final_url.clone());
        if final_url != task.url && !claim_final_url(session, &task, &final_url) {
            tracing::debug!(
                "{} redirects to {}, which is already crawled",
                task.url,
                final_url
            );
            session
                .arena
                .set_state(task.id, UrlState::Skipped(SkipReason::RedirectDuplicate));
            return;
        }

        if let Some(redirect) = &response.unfollowed_redirect {
            self.note_unfollowed_redirect(session, &task, redirect);
        }

        let content_type = response.content_type().map(str::to_string);
        let is_html = content_type.as_deref().is_some_and(is_html_content_type);

        let (title, links, metrics) = if response.is_success() && is_html {
            let parsed = parse_html(&response.body, &response.final_url);
            (parsed.title, dedupe_links(parsed.links), Some(parsed.metrics))
        } else {
            (None, Vec::new(), None)
        };

        // A redirect the crawler chose not to follow is not a failure
        let error = if response.is_success() || response.unfollowed_redirect.is_some() {
            None
        } else {
            tracing::debug!("{} returned HTTP {}", task.url, response.status);
            Some(PageError::HttpStatus {
                status: response.status,
            })
        };

        tracing::debug!(
            "Fetched {} ({}, {} links)",
            task.url,
            response.status,
            links.len()
        );

        self.enqueue_links(session, frontier, &task, &links);

        session.arena.set_state(task.id, UrlState::Fetched);
        session.store_record(
            task.id,
            PageRecord {
                url: task.url,
                final_url,
                depth: task.depth,
                referrer,
                status: Some(response.status),
                content_type,
                title,
                links,
                redirect_chain: response.redirect_chain,
                unfollowed_redirect: response.unfollowed_redirect,
                metrics,
                fetched_at,
                response_time_ms: Some(response.elapsed.as_millis() as u64),
                error,
            },
        );
    }

    /// Accounts for the target of a redirect that was not requested
    fn note_unfollowed_redirect(
        &self,
        session: &mut CrawlSession,
        task: &CrawlTask,
        redirect: &UnfollowedRedirect,
    ) {
        let target = normalize(&redirect.target).unwrap_or_else(|_| redirect.target.clone());
        match redirect.reason {
            RedirectStop::OffOrigin => {
                tracing::debug!("{} redirects off-origin to {}", task.url, target);
                session.external_links.insert(target);
            }
            RedirectStop::RobotsDisallowed => {
                // A queued copy is caught by the robots check at dequeue
                let skipped = UrlState::Skipped(SkipReason::RobotsDisallowed);
                if session
                    .arena
                    .insert(target.clone(), task.depth, Some(task.id), skipped)
                    .is_ok()
                {
                    tracing::debug!("{} redirects to {}, disallowed by robots.txt", task.url, target);
                }
            }
        }
    }

    /// Queues same-origin links one level below `parent`
    fn enqueue_links(
        &self,
        session: &mut CrawlSession,
        frontier: &mut Frontier,
        parent: &CrawlTask,
        links: &[Url],
    ) {
        let depth = parent.depth + 1;
        let within_depth = depth <= self.settings.max_depth;

        for link in links {
            if !session.origin.contains(link) {
                session.external_links.insert(link.clone());
                continue;
            }

            let state = if within_depth {
                UrlState::Queued
            } else {
                UrlState::Skipped(SkipReason::DepthExceeded)
            };

            match session
                .arena
                .insert(link.clone(), depth, Some(parent.id), state)
            {
                Ok(id) if within_depth => frontier.push(CrawlTask {
                    id,
                    url: link.clone(),
                    depth,
                    referrer: Some(parent.id),
                }),
                Ok(_) => tracing::debug!("{} is beyond max depth {}", link, self.settings.max_depth),
                // Completion order can differ from dispatch order, so a link
                // first seen too deep may turn up again within depth
                Err(existing)
                    if within_depth
                        && session.arena.state(existing)
                            == UrlState::Skipped(SkipReason::DepthExceeded) =>
                {
                    session.arena.requeue(existing, depth, Some(parent.id));
                    frontier.push(CrawlTask {
                        id: existing,
                        url: link.clone(),
                        depth,
                        referrer: Some(parent.id),
                    });
                }
                Err(_) => {}
            }
        }
    }
}

/// Decides whether the requested URL may own `final_url` as its identity
///
/// Returns false if another record already owns it.
fn claim_final_url(session: &mut CrawlSession, task: &CrawlTask, final_url: &Url) -> bool {
    let existing = match session.arena.insert(
        final_url.clone(),
        task.depth,
        task.referrer,
        UrlState::Alias(task.id),
    ) {
        Ok(_) => return true,
        Err(existing) => existing,
    };

    let state = session.arena.state(existing);
    if state.is_claimed() {
        return false;
    }
    if state == UrlState::Queued {
        session.arena.set_state(existing, UrlState::Alias(task.id));
    }
    true
}

/// Normalizes links and drops repeats, keeping document order
fn dedupe_links(links: Vec<Url>) -> Vec<Url> {
    let mut seen = HashSet::new();
    links
        .iter()
        .filter_map(|link| normalize(link).ok())
        .filter(|link| seen.insert(link.as_str().to_string()))
        .collect()
}

/// Converts a robots.txt crawl-delay in seconds to a limiter interval
///
/// Non-positive and non-finite values are ignored; anything above
/// [`MAX_CRAWL_DELAY`] is clamped before the conversion.
fn crawl_delay_interval(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    let seconds = seconds.min(MAX_CRAWL_DELAY.as_secs_f64());
    Duration::try_from_secs_f64(seconds).ok()
}

/// Pulls tasks off the shared channel until it closes
///
/// `fetcher` is the session's [`RedirectFollower`], which rate limits and
/// times out every request itself.
async fn fetch_worker(
    worker_id: usize,
    tasks: Arc<Mutex<mpsc::Receiver<CrawlTask>>>,
    results: mpsc::Sender<FetchOutcome>,
    fetcher: Arc<dyn Fetcher>,
) {
    loop {
        let task = tasks.lock().await.recv().await;
        let Some(task) = task else {
            break;
        };

        tracing::trace!("Worker {} fetching {}", worker_id, task.url);
        let result = fetcher.fetch(&task.url).await.map_err(PageError::from);

        let outcome = FetchOutcome {
            task,
            result,
            fetched_at: Utc::now(),
        };
        if results.send(outcome).await.is_err() {
            break;
        }
    }
}
