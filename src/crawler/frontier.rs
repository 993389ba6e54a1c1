//! Crawl frontier: pending queue, visited set, and in-flight accounting
//!
//! The frontier is the only shared mutable state of a crawl job. The visited
//! check-and-insert, the depth check, and the scope check all happen under a
//! single mutex acquisition, which is what guarantees at-most-once visitation
//! under concurrent discovery.

use crate::scope;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A URL queued for fetching
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// The URL to fetch (already normalized)
    pub url: Url,

    /// Link depth from the seed (seed is 0)
    pub depth: u32,

    /// The page this URL was discovered on, absent for the seed
    pub origin: Option<Url>,
}

impl FetchRequest {
    /// Creates the bootstrap request for the base URL
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            depth: 0,
            origin: None,
        }
    }

    /// Creates a request for a link discovered on another page
    pub fn child(url: Url, depth: u32, origin: Url) -> Self {
        Self {
            url,
            depth,
            origin: Some(origin),
        }
    }
}

/// Result of an enqueue attempt
///
/// The three rejection variants are the expected, benign races of concurrent
/// discovery; callers log them at debug level and move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The URL was added to the queue and visited set
    Enqueued,
    /// The URL was already enqueued or fetched within this job
    AlreadyVisited,
    /// The URL's discovery depth exceeds the configured maximum
    DepthExceeded,
    /// The URL's host is not the allowed host
    OutOfScope,
}

impl EnqueueOutcome {
    /// Returns true if the URL was actually enqueued
    pub fn accepted(self) -> bool {
        matches!(self, Self::Enqueued)
    }
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<FetchRequest>,
    visited: HashSet<String>,
    in_flight: usize,
    drained: bool,
}

/// Thread-safe frontier for one crawl job
///
/// Tracks the pending queue, the append-only visited set, and the in-flight
/// counter. The counter is incremented on dequeue and decremented via
/// [`Frontier::task_done`] only after a worker's full unit of work (including
/// link extraction and child enqueues) completes; queue-empty plus
/// zero-in-flight is the sole termination condition.
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    wakeup: Notify,
    allowed_host: String,
    max_depth: u32,
}

impl Frontier {
    /// Creates an empty frontier scoped to one host
    pub fn new(allowed_host: impl Into<String>, max_depth: u32) -> Self {
        Self {
            inner: Mutex::new(FrontierInner::default()),
            wakeup: Notify::new(),
            allowed_host: allowed_host.into(),
            max_depth,
        }
    }

    /// Attempts to enqueue a fetch request
    ///
    /// Rejects the request if its depth exceeds the maximum, its host is out
    /// of scope, or its URL is already in the visited set. The visited
    /// check-and-insert is atomic with respect to concurrent enqueues.
    pub fn enqueue(&self, request: FetchRequest) -> EnqueueOutcome {
        if request.depth > self.max_depth {
            return EnqueueOutcome::DepthExceeded;
        }

        if !scope::is_in_scope(&request.url, &self.allowed_host) {
            return EnqueueOutcome::OutOfScope;
        }

        {
            let mut inner = self.inner.lock().unwrap();
            if !inner.visited.insert(request.url.as_str().to_string()) {
                return EnqueueOutcome::AlreadyVisited;
            }
            inner.queue.push_back(request);
        }

        self.wakeup.notify_one();
        EnqueueOutcome::Enqueued
    }

    /// Pulls the next request, blocking until one is available
    ///
    /// Returns `None` when the job is drained (queue empty and nothing in
    /// flight) or the cancellation token fires. A returned request counts as
    /// in flight until [`Frontier::task_done`] is called for it.
    pub async fn dequeue(&self, cancel: &CancellationToken) -> Option<FetchRequest> {
        loop {
            // Register for wakeups before inspecting state so a notification
            // between the check and the await is not lost.
            let notified = self.wakeup.notified();
            tokio::pin!(notified);

            {
                let mut inner = self.inner.lock().unwrap();

                if cancel.is_cancelled() {
                    return None;
                }

                if let Some(request) = inner.queue.pop_front() {
                    inner.in_flight += 1;
                    return Some(request);
                }

                if inner.drained || inner.in_flight == 0 {
                    inner.drained = true;
                    drop(inner);
                    self.wakeup.notify_waiters();
                    return None;
                }
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    /// Marks one dequeued request's unit of work as complete
    ///
    /// Must be called exactly once per successful dequeue, after link
    /// extraction and child enqueues have finished. The call that observes an
    /// empty queue with nothing left in flight marks the frontier drained and
    /// wakes all blocked dequeuers.
    pub fn task_done(&self) {
        let wake = {
            let mut inner = self.inner.lock().unwrap();
            debug_assert!(inner.in_flight > 0, "task_done without matching dequeue");
            inner.in_flight = inner.in_flight.saturating_sub(1);
            if inner.queue.is_empty() && inner.in_flight == 0 {
                inner.drained = true;
                true
            } else {
                false
            }
        };

        if wake {
            self.wakeup.notify_waiters();
        }
    }

    /// Returns true once the frontier has permanently run out of work
    pub fn is_drained(&self) -> bool {
        self.inner.lock().unwrap().drained
    }

    /// Number of requests waiting in the queue
    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }

    /// Number of dequeued requests not yet marked done
    pub fn in_flight(&self) -> usize {
        self.inner.lock().unwrap().in_flight
    }

    /// Number of URLs ever accepted into the visited set
    pub fn visited_count(&self) -> usize {
        self.inner.lock().unwrap().visited.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn frontier() -> Frontier {
        Frontier::new("example.com", 2)
    }

    #[test]
    fn test_enqueue_seed() {
        let f = frontier();
        let outcome = f.enqueue(FetchRequest::seed(url("https://example.com/")));
        assert_eq!(outcome, EnqueueOutcome::Enqueued);
        assert_eq!(f.pending(), 1);
        assert_eq!(f.visited_count(), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let f = frontier();
        assert!(f.enqueue(FetchRequest::seed(url("https://example.com/a"))).accepted());
        let outcome = f.enqueue(FetchRequest::child(
            url("https://example.com/a"),
            1,
            url("https://example.com/"),
        ));
        assert_eq!(outcome, EnqueueOutcome::AlreadyVisited);
        assert_eq!(f.pending(), 1);
    }

    #[test]
    fn test_three_links_same_target_enqueue_once() {
        let f = frontier();
        let origin = url("https://example.com/");
        let mut accepted = 0;
        for _ in 0..3 {
            let outcome = f.enqueue(FetchRequest::child(
                url("https://example.com/target"),
                1,
                origin.clone(),
            ));
            if outcome.accepted() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(f.pending(), 1);
        assert_eq!(f.visited_count(), 1);
    }

    #[test]
    fn test_depth_exceeded_rejected() {
        let f = Frontier::new("example.com", 1);
        let outcome = f.enqueue(FetchRequest::child(
            url("https://example.com/deep"),
            2,
            url("https://example.com/"),
        ));
        assert_eq!(outcome, EnqueueOutcome::DepthExceeded);
        assert_eq!(f.visited_count(), 0);
    }

    #[test]
    fn test_out_of_scope_rejected() {
        let f = frontier();
        let outcome = f.enqueue(FetchRequest::child(
            url("http://other-domain.com/x"),
            1,
            url("https://example.com/"),
        ));
        assert_eq!(outcome, EnqueueOutcome::OutOfScope);
        assert_eq!(f.visited_count(), 0);
    }

    #[tokio::test]
    async fn test_dequeue_returns_queued_request() {
        let f = frontier();
        f.enqueue(FetchRequest::seed(url("https://example.com/")));
        let cancel = CancellationToken::new();

        let request = f.dequeue(&cancel).await;
        assert!(request.is_some());
        assert_eq!(f.in_flight(), 1);
        assert_eq!(f.pending(), 0);
    }

    #[tokio::test]
    async fn test_dequeue_empty_frontier_returns_none() {
        let f = frontier();
        let cancel = CancellationToken::new();
        assert!(f.dequeue(&cancel).await.is_none());
        assert!(f.is_drained());
    }

    #[tokio::test]
    async fn test_dequeue_cancelled_returns_none() {
        let f = frontier();
        f.enqueue(FetchRequest::seed(url("https://example.com/")));
        // Hold the only item in flight so a second dequeue would block
        let cancel = CancellationToken::new();
        let _held = f.dequeue(&cancel).await.unwrap();

        cancel.cancel();
        assert!(f.dequeue(&cancel).await.is_none());
    }

    #[tokio::test]
    async fn test_task_done_drains_frontier() {
        let f = Arc::new(frontier());
        f.enqueue(FetchRequest::seed(url("https://example.com/")));
        let cancel = CancellationToken::new();

        let request = f.dequeue(&cancel).await.unwrap();
        assert_eq!(request.depth, 0);

        // A second dequeuer blocks while the first request is in flight
        let f2 = f.clone();
        let cancel2 = cancel.clone();
        let waiter = tokio::spawn(async move { f2.dequeue(&cancel2).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        f.task_done();
        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake after drain")
            .unwrap();
        assert!(result.is_none());
        assert!(f.is_drained());
    }

    #[tokio::test]
    async fn test_in_flight_work_defers_drain() {
        let f = Arc::new(frontier());
        f.enqueue(FetchRequest::seed(url("https://example.com/")));
        let cancel = CancellationToken::new();

        let request = f.dequeue(&cancel).await.unwrap();

        // Worker discovers a child before finishing; frontier must not drain
        f.enqueue(FetchRequest::child(
            url("https://example.com/child"),
            request.depth + 1,
            request.url.clone(),
        ));
        f.task_done();
        assert!(!f.is_drained());

        let child = f.dequeue(&cancel).await;
        assert!(child.is_some());
        f.task_done();
        assert!(f.is_drained());
    }

    #[tokio::test]
    async fn test_concurrent_enqueue_at_most_once() {
        let f = Arc::new(frontier());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let f = f.clone();
            handles.push(tokio::spawn(async move {
                let outcome = f.enqueue(FetchRequest::child(
                    url("https://example.com/contended"),
                    1,
                    url("https://example.com/"),
                ));
                outcome.accepted()
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(f.visited_count(), 1);
    }
}
