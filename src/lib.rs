//! Gleaner: a bounded-domain article crawler
//!
//! This crate implements an asynchronous crawl engine that walks a single web
//! domain, classifies each fetched page as an article or generic content, and
//! routes it to exactly one injected downstream processor.

pub mod classify;
pub mod config;
pub mod crawler;
pub mod process;
pub mod scope;

use thiserror::Error;

/// Main error type for gleaner operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Crawl cancelled")]
    Cancelled,
}

/// Configuration-specific errors
///
/// These are fatal and pre-flight: a `CrawlJob` cannot be constructed from an
/// invalid configuration, so no network activity ever happens for one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("No document processor configured")]
    NoProcessor,
}

/// URL-specific errors
///
/// Fatal for the base URL at job construction; for links discovered during the
/// crawl the offending link is skipped and the crawl continues.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for gleaner operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use classify::{classify, Classification, ClassificationContext};
pub use config::{ClassifyRules, CrawlConfig};
pub use crawler::{
    CompletionGate, CrawlJob, CrawlReport, EnqueueOutcome, FetchRequest, Frontier, JobPhase,
    RateLimiter,
};
pub use process::{DispatchOutcome, Dispatcher, Document, DocumentProcessor, ProcessorError};
pub use scope::{is_in_scope, normalize_url, validate_base_url};
