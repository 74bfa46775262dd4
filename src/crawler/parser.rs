//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from <a> tags and canonical links)
//! - Page title, meta description and on-page counts

use crate::state::{HeadingCounts, PageMetrics};
use scraper::{Html, Node, Selector};
use url::Url;

/// Elements whose text is not visible page content
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// All links found on the page, resolved to absolute URLs
    pub links: Vec<Url>,

    /// Meta description, heading and content counts
    pub metrics: PageMetrics,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links
///
/// Relative links resolve against `<base href>` when present, otherwise
/// against `base_url`. `rel="nofollow"` links are kept.
///
/// # Example
///
/// ```
/// use seo_crawler::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let base = document_base(&document, base_url);
    let title = extract_title(&document);
    let links = extract_document_links(&document, &base);
    let metrics = page_metrics(&document, title.as_deref());

    ParsedPage {
        title,
        links,
        metrics,
    }
}

/// Convenience function for extracting just the links from HTML
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    parse_html(html, base_url).links
}

/// Honors `<base href>` if it resolves to an HTTP(S) URL
fn document_base(document: &Html, base_url: &Url) -> Url {
    let Ok(selector) = Selector::parse("base[href]") else {
        return base_url.clone();
    };

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| base_url.join(href.trim()).ok())
        .filter(crate::url::is_http)
        .unwrap_or_else(|| base_url.clone())
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn page_metrics(document: &Html, title: Option<&str>) -> PageMetrics {
    let meta_description = extract_meta_description(document);

    PageMetrics {
        title_length: title.map_or(0, |t| t.chars().count()),
        meta_description_length: meta_description
            .as_deref()
            .map_or(0, |d| d.chars().count()),
        meta_description,
        headings: HeadingCounts {
            h1: count_elements(document, "h1"),
            h2: count_elements(document, "h2"),
            h3: count_elements(document, "h3"),
            h4: count_elements(document, "h4"),
            h5: count_elements(document, "h5"),
            h6: count_elements(document, "h6"),
        },
        word_count: count_words(document),
        anchor_count: count_elements(document, "a[href]"),
        image_count: count_elements(document, "img"),
    }
}

fn extract_meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name][content]").ok()?;

    document
        .select(&selector)
        .find(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("description"))
        })
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn count_elements(document: &Html, selector: &str) -> usize {
    Selector::parse(selector).map_or(0, |selector| document.select(&selector).count())
}

/// Counts words in text nodes outside scripts and styles
fn count_words(document: &Html) -> usize {
    document
        .root_element()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some((node, text)),
            _ => None,
        })
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| INVISIBLE_ELEMENTS.contains(&element.name()))
            })
        })
        .map(|(_, text)| text.split_whitespace().count())
        .sum()
}

fn extract_document_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(url);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute HTTP(S) URL
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    base_url.join(href).ok().filter(crate::url::is_http)
}
