//! Crawler module: frontier, rate limiting, fetching, and the crawl engine
//!
//! This module contains the core crawling machinery, including:
//! - The frontier (pending queue, visited set, in-flight accounting)
//! - Per-domain rate limiting with jitter
//! - HTTP fetching and HTML parsing
//! - The crawl engine that ties them together

mod engine;
mod fetcher;
mod frontier;
mod limiter;
mod parser;

pub use engine::{CompletionGate, CrawlJob, CrawlReport, JobPhase};
pub use fetcher::{build_http_client, fetch, FetchError, FetchResponse};
pub use frontier::{EnqueueOutcome, FetchRequest, Frontier};
pub use limiter::{RateLimiter, RatePermit};
pub use parser::{parse_page, PageDocument};

use crate::config::CrawlConfig;
use crate::process::Dispatcher;
use crate::CrawlError;

/// Runs a complete crawl job
///
/// This is the main entry point for callers that do not need the job handle.
/// It will:
/// 1. Validate the configuration and seed the frontier with the base URL
/// 2. Spawn the worker pool and crawl the domain to exhaustion
/// 3. Route each fetched page to the matching processor
/// 4. Return the crawl report
///
/// Callers that need cancellation or a completion signal should construct a
/// [`CrawlJob`] directly and keep its token and gate before calling
/// [`CrawlJob::run`].
///
/// # Arguments
///
/// * `config` - The crawl configuration
/// * `dispatcher` - The processors to route fetched pages to
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed (by drain, cancellation, or deadline)
/// * `Err(CrawlError)` - The job could not be constructed
pub async fn crawl(config: CrawlConfig, dispatcher: Dispatcher) -> Result<CrawlReport, CrawlError> {
    let job = CrawlJob::new(config, dispatcher)?;
    Ok(job.run().await)
}
