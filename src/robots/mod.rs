//! Robots.txt handling module
//!
//! A session fetches robots.txt once for the seed origin and keeps the
//! parsed policy for its whole lifetime. A missing or unreachable file means
//! no restrictions.

mod parser;

pub use parser::RobotsPolicy;

use crate::crawler::Fetcher;
use crate::url::Origin;

/// Fetches and parses robots.txt for an origin
///
/// # Returns
///
/// * `Some(RobotsPolicy)` - robots.txt was served with a 2xx status
/// * `None` - robots.txt is absent, returned an error status, or could not
///   be fetched; the caller should treat this as "no restrictions"
pub async fn fetch_robots(fetcher: &dyn Fetcher, origin: &Origin) -> Option<RobotsPolicy> {
    let robots_url = match origin.robots_url() {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL for {}: {}", origin, e);
            return None;
        }
    };

    tracing::debug!("Fetching robots.txt from {}", robots_url);

    match fetcher.fetch(&robots_url).await {
        Ok(response) if response.is_success() => {
            tracing::debug!(
                "robots.txt for {} ({} bytes)",
                origin,
                response.body.len()
            );
            Some(RobotsPolicy::from_content(&response.body))
        }
        Ok(response) if (400..500).contains(&response.status) => {
            tracing::debug!(
                "No robots.txt for {} (HTTP {}), crawling without restrictions",
                origin,
                response.status
            );
            None
        }
        Ok(response) => {
            tracing::warn!(
                "robots.txt for {} returned HTTP {}, crawling without restrictions",
                origin,
                response.status
            );
            None
        }
        Err(e) => {
            tracing::warn!(
                "Failed to fetch robots.txt for {}: {}, crawling without restrictions",
                origin,
                e
            );
            None
        }
    }
}
