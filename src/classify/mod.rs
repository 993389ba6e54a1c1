//! Page classification
//!
//! Decides whether a fetched page is an article or generic content. Metadata
//! is the most reliable signal; URL shape is a fallback heuristic, and listing
//! pages short-circuit the URL-shape inference so that index pages with
//! article-like path segments do not become false positives.

mod patterns;

pub use patterns::path_matches;

use crate::config::ClassifyRules;
use crate::crawler::{FetchRequest, FetchResponse, PageDocument};
use url::Url;

/// Terminal classification of a fetched page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// An article page, eligible for the article processor
    Article,
    /// Generic content (listings, landing pages, everything else)
    Content,
    /// Non-HTML or unparseable pages; delivered to no processor
    Unclassifiable,
}

impl Classification {
    /// Returns true if the page was classified as an article
    pub fn is_article(&self) -> bool {
        matches!(self, Self::Article)
    }

    /// Returns true if the page can be delivered to a processor
    pub fn is_dispatchable(&self) -> bool {
        !matches!(self, Self::Unclassifiable)
    }
}

/// Per-request classification state
///
/// Created when a response arrives and owned by one worker for the duration of
/// that request's processing; never shared across tasks, so it needs no
/// synchronization.
#[derive(Debug)]
pub struct ClassificationContext {
    /// The originating fetch request
    pub request: FetchRequest,

    /// The fetched response
    pub response: FetchResponse,

    /// The parsed document, absent for non-HTML responses
    pub document: Option<PageDocument>,

    /// The classification, unknown until [`ClassificationContext::classify`] runs
    pub classification: Option<Classification>,
}

impl ClassificationContext {
    /// Creates a context for one fetched page
    pub fn new(
        request: FetchRequest,
        response: FetchResponse,
        document: Option<PageDocument>,
    ) -> Self {
        Self {
            request,
            response,
            document,
            classification: None,
        }
    }

    /// Decides and records the terminal classification for this page
    pub fn classify(&mut self, rules: &ClassifyRules) -> Classification {
        let classification = match &self.document {
            Some(doc) => classify(doc, &self.response.final_url, rules),
            None => Classification::Unclassifiable,
        };
        self.classification = Some(classification);
        classification
    }
}

/// Classifies a parsed page as article or content
///
/// Deterministic and side-effect-free. Precedence:
///
/// 1. A configured metadata key explicitly declares `article`
/// 2. A schema item type contains "article" (case-insensitive)
/// 3. The URL path matches a listing pattern (listings are never articles)
/// 4. The URL path matches an article pattern AND the document carries
///    structural evidence (a time element, a byline block)
/// 5. Otherwise: content
///
/// Note the asymmetry between steps 1-2 and step 4: explicit metadata beats a
/// listing-shaped URL, but a listing-shaped URL beats article-shaped URL
/// inference.
pub fn classify(doc: &PageDocument, url: &Url, rules: &ClassifyRules) -> Classification {
    for key in &rules.article_meta_keys {
        if let Some(value) = doc.metadata.get(key.as_str()) {
            if value.trim().eq_ignore_ascii_case("article") {
                return Classification::Article;
            }
        }
    }

    if doc
        .schema_types
        .iter()
        .any(|t| t.to_ascii_lowercase().contains("article"))
    {
        return Classification::Article;
    }

    let path = url.path();

    if path_matches(path, &rules.listing_patterns) {
        return Classification::Content;
    }

    if path_matches(path, &rules.article_patterns) && doc.has_evidence {
        return Classification::Article;
    }

    Classification::Content
}
