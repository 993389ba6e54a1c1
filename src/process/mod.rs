//! Document processors and dispatch
//!
//! The crawl engine does not persist anything itself; classified pages are
//! handed to injected [`DocumentProcessor`] implementations. Dispatch is
//! mutually exclusive: a page reaches at most one processor.

use crate::classify::Classification;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Error returned by a document processor
///
/// Processor failures are never fatal to the crawl; the engine logs and
/// counts them and moves on.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProcessorError {
    pub message: String,
}

impl ProcessorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A classified page ready for downstream processing
#[derive(Debug, Clone)]
pub struct Document {
    /// The URL that was requested
    pub url: Url,

    /// The URL the response actually came from (after redirects)
    pub final_url: Url,

    /// Page title, if one was extracted
    pub title: Option<String>,

    /// Raw response body
    pub body: String,

    /// Page metadata (meta tag property/name -> content)
    pub metadata: HashMap<String, String>,

    /// The terminal classification
    pub classification: Classification,

    /// Link depth at which the page was discovered
    pub depth: u32,
}

/// A downstream consumer of classified pages
///
/// Implementations are injected at job construction. Article and content
/// processors share this interface; the [`Dispatcher`] decides which one a
/// page goes to.
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    async fn process(&self, document: &Document) -> Result<(), ProcessorError>;
}

/// Which processor, if any, handled a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The article processor handled the page
    Article,
    /// The content processor handled the page
    Content,
    /// No configured processor matched
    Skipped,
}

/// Routes each classified page to exactly one processor
///
/// Priority order: an article goes to the article processor when one is
/// configured, otherwise to the content processor; generic content goes to
/// the content processor; unclassifiable pages go nowhere.
#[derive(Clone, Default)]
pub struct Dispatcher {
    article: Option<Arc<dyn DocumentProcessor>>,
    content: Option<Arc<dyn DocumentProcessor>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the processor that receives article pages
    pub fn with_article_processor(mut self, processor: Arc<dyn DocumentProcessor>) -> Self {
        self.article = Some(processor);
        self
    }

    /// Sets the processor that receives generic content pages
    pub fn with_content_processor(mut self, processor: Arc<dyn DocumentProcessor>) -> Self {
        self.content = Some(processor);
        self
    }

    /// Returns true if no processor is configured at all
    pub fn is_empty(&self) -> bool {
        self.article.is_none() && self.content.is_none()
    }

    /// Delivers a document to the matching processor
    ///
    /// # Returns
    ///
    /// * `Ok(DispatchOutcome)` - which processor (if any) handled the page
    /// * `Err(ProcessorError)` - the selected processor failed
    pub async fn dispatch(&self, document: &Document) -> Result<DispatchOutcome, ProcessorError> {
        let (processor, outcome) = match document.classification {
            Classification::Article => match (&self.article, &self.content) {
                (Some(p), _) => (p, DispatchOutcome::Article),
                (None, Some(p)) => (p, DispatchOutcome::Content),
                (None, None) => {
                    self.log_skip(document);
                    return Ok(DispatchOutcome::Skipped);
                }
            },
            Classification::Content => match &self.content {
                Some(p) => (p, DispatchOutcome::Content),
                None => {
                    self.log_skip(document);
                    return Ok(DispatchOutcome::Skipped);
                }
            },
            Classification::Unclassifiable => {
                self.log_skip(document);
                return Ok(DispatchOutcome::Skipped);
            }
        };

        processor.process(document).await?;
        Ok(outcome)
    }

    fn log_skip(&self, document: &Document) {
        tracing::debug!(
            url = %document.url,
            classification = ?document.classification,
            "no processor matched"
        );
    }
}
