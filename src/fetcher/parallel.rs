use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::Instant;

use crate::domain::{FetchFailure, FetchOutcome, FetchTarget};
use crate::fetcher::{fetch_one, ConcurrencyLimiter, Transport};

pub const DEFAULT_WORKERS: usize = 10;

/// Receives one call per finished target, in completion order.
pub trait ProgressObserver: Send + Sync {
    fn on_complete(&self, completed: usize, total: usize, outcome: &FetchOutcome);
}

/// Observer that ignores progress.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_complete(&self, _completed: usize, _total: usize, _outcome: &FetchOutcome) {}
}

/// Everything a batch produced, in completion order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FetchOutcome>,
    /// Limiter slots handed out during the batch.
    pub acquisitions: usize,
    pub peak_in_flight: usize,
}

impl BatchReport {
    /// Successful payload bodies.
    pub fn payloads(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(FetchOutcome::body)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&FetchTarget, &FetchFailure)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FetchOutcome::Failure { target, reason } => Some((target, reason)),
            FetchOutcome::Success { .. } => None,
        })
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }
}

pub struct ParallelFetcher {
    transport: Arc<dyn Transport + Send + Sync>,
    workers: usize,
    batch_timeout: Option<Duration>,
}

impl ParallelFetcher {
    pub fn new(transport: Arc<dyn Transport + Send + Sync>) -> Self {
        Self::with_workers(transport, DEFAULT_WORKERS)
    }

    pub fn with_workers(transport: Arc<dyn Transport + Send + Sync>, workers: usize) -> Self {
        Self {
            transport,
            workers,
            batch_timeout: None,
        }
    }

    /// Caps the whole batch. Targets still running at the deadline are
    /// aborted and reported as [`FetchFailure::Cancelled`].
    pub fn with_batch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.batch_timeout = timeout;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub async fn fetch_all(&self, targets: Vec<FetchTarget>) -> BatchReport {
        self.fetch_all_observed(targets, &NoProgress).await
    }

    /// Runs every target to a terminal state. Dropping the returned future
    /// aborts the fetches still in flight.
    pub async fn fetch_all_observed(
        &self,
        targets: Vec<FetchTarget>,
        observer: &dyn ProgressObserver,
    ) -> BatchReport {
        let total = targets.len();
        if total == 0 {
            return BatchReport::default();
        }

        let limiter = Arc::new(ConcurrencyLimiter::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut batch = Batch::new(total, observer);

        for target in targets {
            let transport = self.transport.clone();
            let limiter = limiter.clone();
            let task_target = target.clone();

            let handle = tasks.spawn(async move {
                fetch_one(transport.as_ref(), &limiter, task_target).await
            });
            batch.track(handle.id(), target);
        }

        let deadline = self.batch_timeout.map(|timeout| Instant::now() + timeout);

        loop {
            let joined = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, tasks.join_next_with_id()).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            drain_ready(&mut tasks, &mut batch).await;
                            break;
                        }
                    }
                }
                None => tasks.join_next_with_id().await,
            };

            let Some(joined) = joined else {
                break;
            };
            batch.settle(joined);
        }

        tasks.abort_all();
        if batch.unfinished() > 0 {
            tracing::warn!(
                "Batch deadline reached with {} of {} fetches unfinished",
                batch.unfinished(),
                total
            );
        }
        let outcomes = batch.cancel_remaining();

        BatchReport {
            outcomes,
            acquisitions: limiter.acquisitions(),
            peak_in_flight: limiter.peak_in_flight(),
        }
    }
}

/// Settles tasks that finished by the deadline but were not yet joined.
async fn drain_ready(tasks: &mut JoinSet<FetchOutcome>, batch: &mut Batch<'_>) {
    loop {
        // Let woken tasks run to completion before checking.
        tokio::task::yield_now().await;
        match tasks.join_next_with_id().now_or_never() {
            Some(Some(joined)) => batch.settle(joined),
            _ => break,
        }
    }
}

/// Bookkeeping for one batch: which targets are still pending and the
/// outcomes recorded so far.
struct Batch<'a> {
    pending: HashMap<Id, FetchTarget>,
    order: Vec<Id>,
    outcomes: Vec<FetchOutcome>,
    total: usize,
    observer: &'a dyn ProgressObserver,
}

impl<'a> Batch<'a> {
    fn new(total: usize, observer: &'a dyn ProgressObserver) -> Self {
        Self {
            pending: HashMap::with_capacity(total),
            order: Vec::with_capacity(total),
            outcomes: Vec::with_capacity(total),
            total,
            observer,
        }
    }

    fn track(&mut self, id: Id, target: FetchTarget) {
        self.order.push(id);
        self.pending.insert(id, target);
    }

    fn unfinished(&self) -> usize {
        self.pending.len()
    }

    fn settle(&mut self, joined: Result<(Id, FetchOutcome), JoinError>) {
        let outcome = match joined {
            Ok((id, outcome)) => {
                self.pending.remove(&id);
                outcome
            }
            Err(e) => {
                let Some(target) = self.pending.remove(&e.id()) else {
                    return;
                };
                FetchOutcome::Failure {
                    target,
                    reason: FetchFailure::Transport(e.to_string()),
                }
            }
        };
        self.record(outcome);
    }

    /// Marks every unsettled target as cancelled, in launch order.
    fn cancel_remaining(mut self) -> Vec<FetchOutcome> {
        for id in std::mem::take(&mut self.order) {
            if let Some(target) = self.pending.remove(&id) {
                self.record(FetchOutcome::Failure {
                    target,
                    reason: FetchFailure::Cancelled,
                });
            }
        }
        self.outcomes
    }

    /// The single place a finished target is logged and reported.
    fn record(&mut self, outcome: FetchOutcome) {
        let completed = self.outcomes.len() + 1;

        match &outcome {
            FetchOutcome::Success { target, .. } => {
                tracing::debug!(
                    "Fetched {} ({}/{})",
                    target.date_label(),
                    completed,
                    self.total
                );
            }
            FetchOutcome::Failure { target, reason } => {
                tracing::warn!("Failed to fetch data for {}: {}", target.date_label(), reason);
            }
        }

        self.observer.on_complete(completed, self.total, &outcome);
        self.outcomes.push(outcome);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{FxError, Result};
    use crate::fetcher::TransportResponse;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Stub that answers from a table and records call depth.
    #[derive(Default)]
    struct StubTransport {
        statuses: HashMap<String, u16>,
        broken: Vec<String>,
        delays: HashMap<String, Duration>,
        default_delay: Duration,
        depth: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl StubTransport {
        fn with_delay(delay: Duration) -> Self {
            Self {
                default_delay: delay,
                ..Self::default()
            }
        }

        fn status(mut self, url: &str, status: u16) -> Self {
            self.statuses.insert(url.to_string(), status);
            self
        }

        fn broken(mut self, url: &str) -> Self {
            self.broken.push(url.to_string());
            self
        }

        fn delay(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn get(&self, url: &str) -> Result<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(depth, Ordering::SeqCst);

            let delay = self.delays.get(url).copied().unwrap_or(self.default_delay);
            tokio::time::sleep(delay).await;

            self.depth.fetch_sub(1, Ordering::SeqCst);

            if self.broken.iter().any(|b| b == url) {
                return Err(FxError::Payload(format!("connection reset: {}", url)));
            }
            let status = self.statuses.get(url).copied().unwrap_or(200);
            Ok(TransportResponse {
                status,
                body: format!("payload:{}", url),
            })
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<(usize, usize, bool)>>,
    }

    impl ProgressObserver for RecordingObserver {
        fn on_complete(&self, completed: usize, total: usize, outcome: &FetchOutcome) {
            self.events
                .lock()
                .unwrap()
                .push((completed, total, outcome.is_success()));
        }
    }

    fn targets(names: &[&str]) -> Vec<FetchTarget> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap();
                FetchTarget::new(date, name.to_string())
            })
            .collect()
    }

    fn sorted_payloads(report: &BatchReport) -> Vec<String> {
        let mut payloads: Vec<String> = report.payloads().map(String::from).collect();
        payloads.sort();
        payloads
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cap_two_with_one_not_found() {
        let stub = Arc::new(StubTransport::with_delay(Duration::from_millis(20)).status("T2", 404));
        let fetcher = ParallelFetcher::with_workers(stub.clone(), 2);
        let observer = RecordingObserver::default();

        let report = fetcher
            .fetch_all_observed(targets(&["T1", "T2", "T3", "T4"]), &observer)
            .await;

        assert_eq!(report.success_count(), 3);
        assert_eq!(
            sorted_payloads(&report),
            vec!["payload:T1", "payload:T3", "payload:T4"]
        );

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.url, "T2");
        assert_eq!(failures[0].1, &FetchFailure::Status(404));

        assert!(stub.peak.load(Ordering::SeqCst) <= 2);
        assert!(report.peak_in_flight <= 2);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 4);

        let events = observer.events.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events.iter().filter(|(_, _, ok)| !ok).count(), 1);
        let counts: Vec<_> = events.iter().map(|(c, t, _)| (*c, *t)).collect();
        assert_eq!(counts, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_in_flight_never_exceeds_cap() {
        let names: Vec<String> = (0..25).map(|i| format!("T{}", i)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let stub = Arc::new(StubTransport::with_delay(Duration::from_millis(5)));
        let fetcher = ParallelFetcher::with_workers(stub.clone(), 3);

        let report = fetcher.fetch_all(targets(&names)).await;

        assert_eq!(report.outcomes.len(), 25);
        assert_eq!(report.success_count(), 25);
        assert_eq!(report.acquisitions, 25);
        assert!(stub.peak.load(Ordering::SeqCst) <= 3);
        assert!(report.peak_in_flight <= 3);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 25);
    }

    #[tokio::test]
    async fn test_all_failures_still_terminate() {
        let stub = Arc::new(
            StubTransport::default()
                .status("T1", 500)
                .broken("T2")
                .status("T3", 404),
        );
        let fetcher = ParallelFetcher::new(stub.clone());
        let observer = RecordingObserver::default();

        let report = fetcher
            .fetch_all_observed(targets(&["T1", "T2", "T3"]), &observer)
            .await;

        assert_eq!(report.payloads().count(), 0);
        assert_eq!(report.failure_count(), 3);
        assert_eq!(observer.events.lock().unwrap().len(), 3);
        assert!(report
            .failures()
            .any(|(t, r)| t.url == "T2" && matches!(r, FetchFailure::Transport(_))));
    }

    #[tokio::test]
    async fn test_empty_targets_return_immediately() {
        let stub = Arc::new(StubTransport::default());
        let fetcher = ParallelFetcher::new(stub.clone());

        let report = fetcher.fetch_all(Vec::new()).await;

        assert!(report.outcomes.is_empty());
        assert_eq!(report.acquisitions, 0);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeat_runs_yield_same_payloads() {
        let stub = Arc::new(
            StubTransport::with_delay(Duration::from_millis(2))
                .status("T3", 503)
                .delay("T1", Duration::from_millis(15)),
        );
        let fetcher = ParallelFetcher::with_workers(stub, 2);
        let batch = ["T1", "T2", "T3", "T4", "T5"];

        let first = fetcher.fetch_all(targets(&batch)).await;
        let second = fetcher.fetch_all(targets(&batch)).await;

        assert_eq!(sorted_payloads(&first), sorted_payloads(&second));
        assert_eq!(first.success_count(), 4);
    }

    #[tokio::test]
    async fn test_single_worker_runs_sequentially() {
        let delay = Duration::from_millis(30);
        let stub = Arc::new(StubTransport::with_delay(delay));
        let fetcher = ParallelFetcher::with_workers(stub.clone(), 1);

        let started = std::time::Instant::now();
        let report = fetcher.fetch_all(targets(&["T1", "T2", "T3", "T4"])).await;

        assert!(started.elapsed() >= delay * 4);
        assert_eq!(report.success_count(), 4);
        assert_eq!(stub.peak.load(Ordering::SeqCst), 1);
        assert_eq!(report.peak_in_flight, 1);
    }

    #[tokio::test]
    async fn test_batch_deadline_keeps_partial_results() {
        let stub = Arc::new(
            StubTransport::with_delay(Duration::from_millis(5))
                .delay("T2", Duration::from_secs(5)),
        );
        let fetcher = ParallelFetcher::with_workers(stub, 4)
            .with_batch_timeout(Some(Duration::from_millis(300)));
        let observer = RecordingObserver::default();

        let report = fetcher
            .fetch_all_observed(targets(&["T1", "T2", "T3"]), &observer)
            .await;

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(sorted_payloads(&report), vec!["payload:T1", "payload:T3"]);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.url, "T2");
        assert_eq!(failures[0].1, &FetchFailure::Cancelled);
        assert_eq!(observer.events.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_finishing_at_deadline_is_kept() {
        let stub = Arc::new(StubTransport::with_delay(Duration::from_millis(300)));
        let fetcher = ParallelFetcher::with_workers(stub, 1)
            .with_batch_timeout(Some(Duration::from_millis(300)));

        let report = fetcher.fetch_all(targets(&["T1"])).await;

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.success_count(), 1);
        assert_eq!(sorted_payloads(&report), vec!["payload:T1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cancels_only_unfinished() {
        let stub = Arc::new(
            StubTransport::with_delay(Duration::from_millis(100))
                .delay("T3", Duration::from_secs(60)),
        );
        let fetcher = ParallelFetcher::with_workers(stub, 3)
            .with_batch_timeout(Some(Duration::from_millis(100)));

        let report = fetcher.fetch_all(targets(&["T1", "T2", "T3"])).await;

        assert_eq!(sorted_payloads(&report), vec!["payload:T1", "payload:T2"]);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.url, "T3");
        assert_eq!(failures[0].1, &FetchFailure::Cancelled);
    }

    struct PanickingTransport;

    #[async_trait]
    impl Transport for PanickingTransport {
        async fn get(&self, url: &str) -> Result<TransportResponse> {
            panic!("transport blew up on {}", url);
        }
    }

    #[tokio::test]
    async fn test_panicking_fetch_settles_once() {
        let fetcher = ParallelFetcher::new(Arc::new(PanickingTransport));
        let observer = RecordingObserver::default();

        let report = fetcher
            .fetch_all_observed(targets(&["T1", "T2"]), &observer)
            .await;

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failure_count(), 2);
        assert!(report
            .failures()
            .all(|(_, reason)| matches!(reason, FetchFailure::Transport(_))));
        assert_eq!(observer.events.lock().unwrap().len(), 2);
    }
}
