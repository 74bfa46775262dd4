//! URL handling module
//!
//! This module provides seed validation, URL normalization, and origin
//! comparison for deciding which links stay inside the crawled site.

mod normalize;
mod origin;

// Re-export main functions
pub use normalize::{normalize, normalize_url};
pub use origin::Origin;

use crate::UrlError;
use url::Url;

/// Validates a seed URL and returns its normalized form
///
/// The seed must be an absolute HTTP or HTTPS URL with a host. Relative
/// references, other schemes, and unparseable input are rejected.
///
/// # Examples
///
/// ```
/// use seo_crawler::url::validate_seed;
///
/// let seed = validate_seed("https://Example.com/blog/#top").unwrap();
/// assert_eq!(seed.as_str(), "https://example.com/blog");
///
/// assert!(validate_seed("/relative/path").is_err());
/// assert!(validate_seed("ftp://example.com/").is_err());
/// ```
pub fn validate_seed(seed: &str) -> Result<Url, UrlError> {
    let trimmed = seed.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("seed URL is empty".to_string()));
    }

    normalize_url(trimmed)
}

/// Returns true if the URL uses a scheme the crawler can fetch
pub fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
