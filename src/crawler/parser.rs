//! HTML parsing: metadata, structural evidence, and outbound links
//!
//! All scraper work happens synchronously inside [`parse_page`] so that the
//! parsed output is plain owned data and worker futures stay `Send`.

use crate::config::ClassifyRules;
use scraper::{Html, Selector};
use std::collections::HashMap;
use url::Url;

/// Everything the engine needs from a fetched HTML body
#[derive(Debug, Clone)]
pub struct PageDocument {
    /// The page title (from the `<title>` tag)
    pub title: Option<String>,

    /// Meta tag contents keyed by their `property` or `name` attribute
    pub metadata: HashMap<String, String>,

    /// Schema item types (`itemtype` attribute values)
    pub schema_types: Vec<String>,

    /// Whether any configured evidence selector matched (time element,
    /// byline block)
    pub has_evidence: bool,

    /// Outbound links, resolved to absolute http(s) URLs
    pub links: Vec<Url>,
}

/// Parses an HTML body into a [`PageDocument`]
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="...">` anchors and `<link rel="canonical">` targets,
/// resolved against `base_url`.
///
/// **Exclude:** anchors with a `download` attribute; `javascript:`, `mailto:`,
/// `tel:` and `data:` hrefs; fragment-only hrefs; anything that resolves to a
/// non-http(s) URL.
///
/// # Arguments
///
/// * `html` - The response body
/// * `base_url` - The response's final URL, for resolving relative links
/// * `rules` - Classification rules supplying the evidence selectors
pub fn parse_page(html: &str, base_url: &Url, rules: &ClassifyRules) -> PageDocument {
    let document = Html::parse_document(html);

    PageDocument {
        title: extract_title(&document),
        metadata: extract_metadata(&document),
        schema_types: extract_schema_types(&document),
        has_evidence: detect_evidence(&document, rules),
        links: extract_links(&document, base_url),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects meta tags into a key -> content map
///
/// The `property` attribute wins over `name` when both are present, matching
/// how Open Graph tags are written in practice. Keys are lowercased.
fn extract_metadata(document: &Html) -> HashMap<String, String> {
    let mut metadata = HashMap::new();

    if let Ok(selector) = Selector::parse("meta[content]") {
        for element in document.select(&selector) {
            let key = element
                .value()
                .attr("property")
                .or_else(|| element.value().attr("name"));

            if let (Some(key), Some(content)) = (key, element.value().attr("content")) {
                metadata.insert(key.to_lowercase(), content.to_string());
            }
        }
    }

    metadata
}

fn extract_schema_types(document: &Html) -> Vec<String> {
    let mut types = Vec::new();

    if let Ok(selector) = Selector::parse("[itemtype]") {
        for element in document.select(&selector) {
            if let Some(itemtype) = element.value().attr("itemtype") {
                for value in itemtype.split_whitespace() {
                    types.push(value.to_string());
                }
            }
        }
    }

    types
}

fn detect_evidence(document: &Html, rules: &ClassifyRules) -> bool {
    rules.evidence_selectors.iter().any(|raw| {
        Selector::parse(raw)
            .map(|selector| document.select(&selector).next().is_some())
            .unwrap_or(false)
    })
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_link(href, base_url) {
                    links.push(url);
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_link(href, base_url) {
                    links.push(url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL, filtering out non-page links
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        _ => None,
    }
}
