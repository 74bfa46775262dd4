use serde::Deserialize;

/// Main configuration structure, loaded from TOML
///
/// Every section and key is optional; missing values take the defaults
/// documented on each field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched per session, seed included (default 100)
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Maximum link depth from the seed (default 3)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Session-wide request ceiling (default 2)
    #[serde(rename = "requests-per-second")]
    pub requests_per_second: f64,

    /// Number of concurrent fetch workers (default 5)
    pub workers: usize,

    /// Per-fetch timeout in seconds (default 30)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Redirect hops followed before giving up (default 5)
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            max_depth: 3,
            requests_per_second: 2.0,
            workers: 5,
            request_timeout: 30,
            max_redirects: 5,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler; also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SEO-Auditor-Bot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://github.com/your-org/seo-auditor".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}
