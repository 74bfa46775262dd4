use crate::UrlError;
use std::fmt;
use url::Url;

/// The scheme, host and port a crawl session is confined to
///
/// Two URLs are same-origin when all three components match. The port is
/// compared after applying the scheme's default, so `https://example.com/`
/// and `https://example.com:443/` share an origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: String,
    host: String,
    port: u16,
}

impl Origin {
    /// Extracts the origin of a URL
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use seo_crawler::url::Origin;
    ///
    /// let origin = Origin::of(&Url::parse("https://Example.com/path").unwrap()).unwrap();
    /// assert_eq!(origin.to_string(), "https://example.com");
    /// ```
    pub fn of(url: &Url) -> Result<Self, UrlError> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(UrlError::MissingHost)?
            .to_lowercase();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| UrlError::InvalidScheme(url.scheme().to_string()))?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port,
        })
    }

    /// Returns true if the URL belongs to this origin
    pub fn contains(&self, url: &Url) -> bool {
        url.scheme() == self.scheme
            && url.port_or_known_default() == Some(self.port)
            && url
                .host_str()
                .is_some_and(|h| h.eq_ignore_ascii_case(&self.host))
    }

    /// Returns the robots.txt location for this origin
    pub fn robots_url(&self) -> Result<Url, UrlError> {
        Url::parse(&format!("{}/robots.txt", self)).map_err(|e| UrlError::Malformed(e.to_string()))
    }

    /// The lowercase host of this origin
    pub fn host(&self) -> &str {
        &self.host
    }

    fn default_port(&self) -> Option<u16> {
        match self.scheme.as_str() {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.default_port() == Some(self.port) {
            write!(f, "{}://{}", self.scheme, self.host)
        } else {
            write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}
