//! Crawl engine: worker pool, per-request pipeline, and completion
//!
//! The engine owns one crawl job from seed to completion. A fixed pool of
//! workers pulls from the frontier; each worker drives one request through
//! rate limiting, fetch, parse, classify, link discovery, and dispatch, then
//! marks its unit of work done. The job terminates when the frontier drains
//! or the job token is cancelled, and the completion gate closes exactly once
//! either way.

use crate::classify::{Classification, ClassificationContext};
use crate::config::{self, CrawlConfig};
use crate::crawler::fetcher::{build_http_client, fetch};
use crate::crawler::frontier::{EnqueueOutcome, FetchRequest, Frontier};
use crate::crawler::limiter::RateLimiter;
use crate::crawler::parser::parse_page;
use crate::process::{DispatchOutcome, Dispatcher, Document};
use crate::scope;
use crate::{ConfigError, CrawlError};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Lifecycle phase of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// Work remains in the frontier or in flight
    Running = 0,
    /// Frontier drained; workers are shutting down
    Draining = 1,
    /// Completion signal closed
    Done = 2,
}

impl JobPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Draining,
            _ => Self::Done,
        }
    }
}

/// One-shot completion signal for a crawl job
///
/// Clones share the same gate. `wait` may be called before or after the gate
/// closes and by any number of tasks; `complete` closes it exactly once no
/// matter how many callers race.
#[derive(Clone, Default)]
pub struct CompletionGate {
    inner: Arc<GateInner>,
}

#[derive(Default)]
struct GateInner {
    done: AtomicBool,
    notify: Notify,
}

impl CompletionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the gate; returns true only for the call that actually closed it
    pub(crate) fn complete(&self) -> bool {
        if self.inner.done.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.notify.notify_waiters();
        true
    }

    /// Returns true once the gate has closed
    pub fn is_done(&self) -> bool {
        self.inner.done.load(Ordering::SeqCst)
    }

    /// Waits until the gate closes; returns immediately if it already has
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            if self.inner.done.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    pages_fetched: AtomicU64,
    articles_dispatched: AtomicU64,
    content_dispatched: AtomicU64,
    pages_skipped: AtomicU64,
    transport_errors: AtomicU64,
    processor_errors: AtomicU64,
    links_discovered: AtomicU64,
    links_enqueued: AtomicU64,
    duplicates_skipped: AtomicU64,
    depth_exceeded_skipped: AtomicU64,
    out_of_scope_skipped: AtomicU64,
    invalid_links_skipped: AtomicU64,
}

macro_rules! bump {
    ($counters:expr, $field:ident) => {
        $counters.$field.fetch_add(1, Ordering::Relaxed)
    };
}

/// Summary of one finished crawl job
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub pages_fetched: u64,
    pub articles_dispatched: u64,
    pub content_dispatched: u64,
    pub pages_skipped: u64,
    pub transport_errors: u64,
    pub processor_errors: u64,
    pub links_discovered: u64,
    pub links_enqueued: u64,
    pub duplicates_skipped: u64,
    pub depth_exceeded_skipped: u64,
    pub out_of_scope_skipped: u64,
    pub invalid_links_skipped: u64,
    /// URLs ever accepted into the visited set (including the seed)
    pub urls_visited: u64,
    pub elapsed: Duration,
    /// True if the job ended by cancellation or deadline rather than drain
    pub cancelled: bool,
}

impl Counters {
    fn snapshot(&self, elapsed: Duration, cancelled: bool, urls_visited: usize) -> CrawlReport {
        CrawlReport {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            articles_dispatched: self.articles_dispatched.load(Ordering::Relaxed),
            content_dispatched: self.content_dispatched.load(Ordering::Relaxed),
            pages_skipped: self.pages_skipped.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            processor_errors: self.processor_errors.load(Ordering::Relaxed),
            links_discovered: self.links_discovered.load(Ordering::Relaxed),
            links_enqueued: self.links_enqueued.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            depth_exceeded_skipped: self.depth_exceeded_skipped.load(Ordering::Relaxed),
            out_of_scope_skipped: self.out_of_scope_skipped.load(Ordering::Relaxed),
            invalid_links_skipped: self.invalid_links_skipped.load(Ordering::Relaxed),
            urls_visited: urls_visited as u64,
            elapsed,
            cancelled,
        }
    }
}

/// Shared state handed to each worker
struct WorkerCtx {
    config: Arc<CrawlConfig>,
    frontier: Arc<Frontier>,
    limiter: Arc<RateLimiter>,
    client: Client,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
    counters: Arc<Counters>,
    phase: Arc<AtomicU8>,
}

/// One crawl job: immutable configuration plus run state
///
/// Owns its frontier, visited set, and rate limiter; concurrent jobs for
/// different base URLs share nothing.
pub struct CrawlJob {
    config: Arc<CrawlConfig>,
    frontier: Arc<Frontier>,
    limiter: Arc<RateLimiter>,
    client: Client,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
    gate: CompletionGate,
    phase: Arc<AtomicU8>,
    counters: Arc<Counters>,
}

impl CrawlJob {
    /// Builds a job, failing fast on any configuration problem
    ///
    /// The base URL is validated, normalized, and seeded into the frontier at
    /// depth 0; no network activity happens here.
    pub fn new(config: CrawlConfig, dispatcher: Dispatcher) -> Result<Self, CrawlError> {
        config::validate(&config)?;

        if dispatcher.is_empty() {
            return Err(ConfigError::NoProcessor.into());
        }

        let (_, allowed_host) = scope::validate_base_url(&config.base_url)?;
        let seed = scope::normalize_url(&config.base_url)?;

        let frontier = Arc::new(Frontier::new(allowed_host, config.max_depth));
        let outcome = frontier.enqueue(FetchRequest::seed(seed));
        debug_assert!(outcome.accepted());

        let limiter = Arc::new(RateLimiter::new(
            config.parallelism,
            Duration::from_millis(config.request_interval_ms),
            Duration::from_millis(config.jitter_ms),
        ));

        let client = build_http_client(&config.user_agent)?;

        Ok(Self {
            config: Arc::new(config),
            frontier,
            limiter,
            client,
            dispatcher: Arc::new(dispatcher),
            cancel: CancellationToken::new(),
            gate: CompletionGate::new(),
            phase: Arc::new(AtomicU8::new(JobPhase::Running as u8)),
            counters: Arc::new(Counters::default()),
        })
    }

    /// The job-scoped cancellation token; cancelling it stops all workers at
    /// their next blocking point
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels the job without waiting for the frontier to drain
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A completion signal the caller can await alongside [`CrawlJob::run`]
    pub fn completion_gate(&self) -> CompletionGate {
        self.gate.clone()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> JobPhase {
        JobPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Runs the crawl to completion and returns the report
    pub async fn run(self) -> CrawlReport {
        let started = Instant::now();
        tracing::info!(
            base_url = %self.config.base_url,
            max_depth = self.config.max_depth,
            parallelism = self.config.parallelism,
            "starting crawl"
        );

        if let Some(deadline_ms) = self.config.deadline_ms {
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(deadline_ms)) => {
                        tracing::warn!(deadline_ms, "job deadline reached, cancelling");
                        cancel.cancel();
                    }
                    _ = cancel.cancelled() => {}
                }
            });
        }

        let ctx = Arc::new(WorkerCtx {
            config: self.config.clone(),
            frontier: self.frontier.clone(),
            limiter: self.limiter.clone(),
            client: self.client.clone(),
            dispatcher: self.dispatcher.clone(),
            cancel: self.cancel.clone(),
            counters: self.counters.clone(),
            phase: self.phase.clone(),
        });

        let mut workers = Vec::with_capacity(self.config.parallelism);
        for worker_id in 0..self.config.parallelism {
            let ctx = ctx.clone();
            workers.push(tokio::spawn(worker_loop(worker_id, ctx)));
        }

        for worker in workers {
            let _ = worker.await;
        }

        let cancelled = self.cancel.is_cancelled();

        // Stop the deadline watcher if it is still pending
        self.cancel.cancel();

        self.set_phase(JobPhase::Done);
        self.gate.complete();

        let report = self
            .counters
            .snapshot(started.elapsed(), cancelled, self.frontier.visited_count());
        tracing::info!(
            pages_fetched = report.pages_fetched,
            articles = report.articles_dispatched,
            content = report.content_dispatched,
            transport_errors = report.transport_errors,
            processor_errors = report.processor_errors,
            elapsed_ms = report.elapsed.as_millis() as u64,
            cancelled,
            "crawl finished"
        );
        report
    }

    fn set_phase(&self, to: JobPhase) {
        let from = self.phase.swap(to as u8, Ordering::SeqCst);
        if from != to as u8 {
            tracing::debug!(from = ?JobPhase::from_u8(from), to = ?to, "job phase change");
        }
    }
}

async fn worker_loop(worker_id: usize, ctx: Arc<WorkerCtx>) {
    tracing::debug!(worker_id, "worker started");

    while let Some(request) = ctx.frontier.dequeue(&ctx.cancel).await {
        process_request(&ctx, request).await;
        // The unit of work, including child enqueues, is finished only here
        ctx.frontier.task_done();
    }

    // The first worker to see the drain moves the job out of Running;
    // a cancelled job jumps straight to Done without draining.
    if !ctx.cancel.is_cancelled() && ctx.frontier.is_drained() {
        let moved = ctx
            .phase
            .compare_exchange(
                JobPhase::Running as u8,
                JobPhase::Draining as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if moved {
            tracing::debug!(worker_id, "frontier drained, job draining");
        }
    }

    tracing::debug!(worker_id, "worker stopped");
}

/// Drives one request through fetch, classify, link discovery, and dispatch
///
/// All per-page failures end here: they are logged and counted but never
/// propagate to the worker loop.
async fn process_request(ctx: &WorkerCtx, request: FetchRequest) {
    let permit = match ctx.limiter.acquire(&ctx.cancel).await {
        Ok(permit) => permit,
        // Cancelled while waiting for a slot
        Err(_) => return,
    };

    tracing::debug!(url = %request.url, depth = request.depth, "fetching");

    let response = tokio::select! {
        result = fetch(&ctx.client, &request.url) => match result {
            Ok(response) => response,
            Err(error) => {
                bump!(ctx.counters, transport_errors);
                tracing::error!(
                    url = %request.url,
                    depth = request.depth,
                    error = %error,
                    "fetch failed"
                );
                return;
            }
        },
        _ = ctx.cancel.cancelled() => {
            tracing::debug!(url = %request.url, "fetch abandoned, job cancelled");
            return;
        }
    };
    drop(permit);

    bump!(ctx.counters, pages_fetched);

    let document = if response.is_html() {
        Some(parse_page(&response.body, &response.final_url, &ctx.config.rules))
    } else {
        tracing::debug!(
            url = %request.url,
            content_type = %response.content_type,
            "non-HTML response, skipping parse"
        );
        None
    };

    let mut context = ClassificationContext::new(request, response, document);
    let classification = context.classify(&ctx.config.rules);
    tracing::debug!(
        url = %context.request.url,
        depth = context.request.depth,
        status = context.response.status,
        classification = ?classification,
        "page classified"
    );

    // A cancelled worker must not feed the frontier more work
    if !ctx.cancel.is_cancelled() {
        if let Some(doc) = &context.document {
            enqueue_links(ctx, &context.request, &doc.links);
        }
    }

    dispatch(ctx, context).await;
}

/// Attempts to enqueue every discovered link at depth + 1
///
/// Rejections are the expected races of concurrent discovery and are only
/// debug-logged; extraction never blocks on network I/O.
fn enqueue_links(ctx: &WorkerCtx, request: &FetchRequest, links: &[Url]) {
    for link in links {
        bump!(ctx.counters, links_discovered);

        let normalized = match scope::normalize_url(link.as_str()) {
            Ok(url) => url,
            Err(error) => {
                bump!(ctx.counters, invalid_links_skipped);
                tracing::debug!(url = %link, error = %error, "skipping unusable link");
                continue;
            }
        };

        let child = FetchRequest::child(normalized, request.depth + 1, request.url.clone());
        match ctx.frontier.enqueue(child) {
            EnqueueOutcome::Enqueued => {
                bump!(ctx.counters, links_enqueued);
            }
            EnqueueOutcome::AlreadyVisited => {
                bump!(ctx.counters, duplicates_skipped);
                tracing::debug!(url = %link, "link already visited");
            }
            EnqueueOutcome::DepthExceeded => {
                bump!(ctx.counters, depth_exceeded_skipped);
                tracing::debug!(url = %link, depth = request.depth + 1, "link beyond max depth");
            }
            EnqueueOutcome::OutOfScope => {
                bump!(ctx.counters, out_of_scope_skipped);
                tracing::debug!(url = %link, "link out of scope");
            }
        }
    }
}

async fn dispatch(ctx: &WorkerCtx, context: ClassificationContext) {
    let classification = context
        .classification
        .unwrap_or(Classification::Unclassifiable);
    let document = into_document(context, classification);

    match ctx.dispatcher.dispatch(&document).await {
        Ok(DispatchOutcome::Article) => {
            bump!(ctx.counters, articles_dispatched);
        }
        Ok(DispatchOutcome::Content) => {
            bump!(ctx.counters, content_dispatched);
        }
        Ok(DispatchOutcome::Skipped) => {
            bump!(ctx.counters, pages_skipped);
        }
        Err(error) => {
            bump!(ctx.counters, processor_errors);
            tracing::error!(url = %document.url, error = %error, "processor failed");
        }
    }
}

fn into_document(context: ClassificationContext, classification: Classification) -> Document {
    let ClassificationContext {
        request, response, document, ..
    } = context;

    let (title, metadata) = match document {
        Some(doc) => (doc.title, doc.metadata),
        None => (None, HashMap::new()),
    };

    Document {
        url: request.url,
        final_url: response.final_url,
        title,
        body: response.body,
        metadata,
        classification,
        depth: request.depth,
    }
}
