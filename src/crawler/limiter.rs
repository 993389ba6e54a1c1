//! Per-domain rate limiting
//!
//! Bounds how many requests to the crawl's domain are in flight at once and
//! enforces a minimum delay (plus bounded random jitter) between request
//! starts. A crawl of a single domain owns a single limiter; a multi-domain
//! crawl would run one independent limiter per domain.

use crate::CrawlError;
use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// A held rate-limit slot
///
/// Dropping the permit releases the slot exactly once; hold it for the
/// duration of the HTTP request.
pub struct RatePermit {
    _permit: OwnedSemaphorePermit,
}

/// Token/interval gate for one domain
pub struct RateLimiter {
    slots: Arc<Semaphore>,
    interval: Duration,
    jitter: Duration,
    next_start: Mutex<Instant>,
}

impl RateLimiter {
    /// Creates a limiter allowing `parallelism` in-flight requests with at
    /// least `interval` (plus up to `jitter`) between request starts
    pub fn new(parallelism: usize, interval: Duration, jitter: Duration) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(parallelism)),
            interval,
            jitter,
            next_start: Mutex::new(Instant::now()),
        }
    }

    /// Blocks until a request may start, or the token is cancelled
    ///
    /// Never silently drops a request: the caller either receives a permit or
    /// a `Cancelled` error. Waiting is FIFO-ish with no fairness guarantee.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<RatePermit, CrawlError> {
        let permit = tokio::select! {
            permit = self.slots.clone().acquire_owned() => {
                permit.map_err(|_| CrawlError::Cancelled)?
            }
            _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
        };

        // Reserve this request's start slot; later acquirers are pushed past
        // it even if they stop waiting, so spacing survives cancellations.
        let start_at = {
            let mut next = self.next_start.lock().unwrap();
            let now = Instant::now();
            let start_at = (*next).max(now);
            *next = start_at + self.interval + self.pick_jitter();
            start_at
        };

        tokio::select! {
            _ = tokio::time::sleep_until(start_at.into()) => {}
            _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
        }

        Ok(RatePermit { _permit: permit })
    }

    fn pick_jitter(&self) -> Duration {
        let bound = self.jitter.as_millis() as u64;
        if bound == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=bound))
        }
    }
}
