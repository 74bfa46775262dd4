//! Hop-by-hop redirect following
//!
//! [`RedirectFollower`] wraps a single-request [`Fetcher`] and follows
//! redirects itself. Every hop is a separate request, so every hop waits for
//! its own [`RateLimiter`] slot and gets its own timeout. A follower confined
//! to an origin refuses to request redirect targets outside that origin or
//! disallowed by its robots.txt; the redirect response is returned instead,
//! with the refused target recorded in
//! [`FetchResponse::unfollowed_redirect`].

use crate::crawler::fetcher::{FetchError, FetchResponse, Fetcher};
use crate::crawler::rate_limit::RateLimiter;
use crate::robots::RobotsPolicy;
use crate::state::{RedirectStop, UnfollowedRedirect};
use crate::url::Origin;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Where redirects may lead
#[derive(Debug, Clone)]
struct Scope {
    origin: Origin,
    robots: Option<RobotsPolicy>,
    agent: String,
}

/// Rate-limited, scope-checked redirect following over another [`Fetcher`]
pub struct RedirectFollower {
    inner: Arc<dyn Fetcher>,
    limiter: Arc<RateLimiter>,
    max_redirects: usize,
    timeout: Duration,
    scope: Option<Scope>,
}

impl RedirectFollower {
    /// Follows up to `max_redirects` redirects anywhere
    pub fn new(
        inner: Arc<dyn Fetcher>,
        limiter: Arc<RateLimiter>,
        max_redirects: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            inner,
            limiter,
            max_redirects,
            timeout,
            scope: None,
        }
    }

    /// Only follows redirects within `origin` that `robots` allows for `agent`
    pub fn confined_to(
        mut self,
        origin: Origin,
        robots: Option<RobotsPolicy>,
        agent: impl Into<String>,
    ) -> Self {
        self.scope = Some(Scope {
            origin,
            robots,
            agent: agent.into(),
        });
        self
    }

    /// Returns why `target` may not be requested, if it may not
    fn refuses(&self, target: &Url) -> Option<RedirectStop> {
        let scope = self.scope.as_ref()?;
        if !scope.origin.contains(target) {
            return Some(RedirectStop::OffOrigin);
        }
        match &scope.robots {
            Some(robots) if !robots.is_allowed(target, &scope.agent) => {
                Some(RedirectStop::RobotsDisallowed)
            }
            _ => None,
        }
    }

    /// One rate-limited request
    async fn request(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        self.limiter.acquire().await;
        tracing::trace!("Requesting {}", url);

        match tokio::time::timeout(self.timeout, self.inner.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl Fetcher for RedirectFollower {
    /// Fetches `url`, following redirects hop by hop
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Final response (any status) | `Ok(FetchResponse)` |
    /// | Redirect target out of scope | `Ok` with `unfollowed_redirect` set |
    /// | Redirect revisits a URL in the chain | `TooManyRedirects` |
    /// | More than `max_redirects` hops | `TooManyRedirects` |
    /// | Unparseable or non-HTTP `Location` | `InvalidRedirect` |
    /// | A hop times out | `Timeout` |
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let started = Instant::now();
        let mut current = url.clone();
        let mut chain: Vec<Url> = Vec::new();

        loop {
            let mut response = self.request(&current).await?;

            let Some(next) = response.redirect_target()? else {
                response.redirect_chain = chain;
                response.elapsed = started.elapsed();
                return Ok(response);
            };

            if let Some(reason) = self.refuses(&next) {
                tracing::debug!("Not following redirect {} -> {} ({:?})", current, next, reason);
                response.redirect_chain = chain;
                response.unfollowed_redirect = Some(UnfollowedRedirect {
                    target: next,
                    reason,
                });
                response.elapsed = started.elapsed();
                return Ok(response);
            }

            tracing::trace!("{} redirected ({}) to {}", current, response.status, next);
            chain.push(current);

            if chain.len() > self.max_redirects || chain.contains(&next) {
                return Err(FetchError::TooManyRedirects { hops: chain.len() });
            }

            current = next;
        }
    }
}
