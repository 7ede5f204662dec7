//! Query poller
//!
//! Probes a submitted query until it reaches a terminal outcome.
//!
//! Status handling:
//! - `Scheduled`: wait one interval and probe again
//! - `Running`: probe again while fewer rows than the limit have arrived,
//!   otherwise stop the query and return what has been collected
//! - `Complete`: return the snapshot
//! - `Failed`, `Cancelled`, anything else: fail
//!
//! The poller never retries a failed call. A probe error ends polling, and a
//! failed stop request is reported without falling back to polling.

use insight_client::{ClientError, JobCanceller, StatusProber};
use insight_core::{JobHandle, QueryStatus, StatusSnapshot};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::exit;
use crate::scheduler::delay::Delay;

/// Default pause between two probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How the poller paces itself and when it stops a query early
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause before each re-probe
    pub interval: Duration,
    /// Row count at which a still-running query is stopped
    pub limit: usize,
    /// Stop a `Scheduled` query once the limit is reached
    pub early_stop_on_scheduled: bool,
    /// Stop a `Running` query once the limit is reached
    pub early_stop_on_running: bool,
}

impl PollPolicy {
    /// Creates a policy with the default interval, stopping early only while running
    pub fn new(limit: usize) -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            limit,
            early_stop_on_scheduled: false,
            early_stop_on_running: true,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_early_stop_on_scheduled(mut self, enabled: bool) -> Self {
        self.early_stop_on_scheduled = enabled;
        self
    }

    pub fn with_early_stop_on_running(mut self, enabled: bool) -> Self {
        self.early_stop_on_running = enabled;
        self
    }

    fn should_stop_early(&self, snapshot: &StatusSnapshot) -> bool {
        let eligible = match snapshot.status {
            QueryStatus::Scheduled => self.early_stop_on_scheduled,
            QueryStatus::Running => self.early_stop_on_running,
            _ => false,
        };
        eligible && snapshot.row_count() >= self.limit
    }
}

/// Successful end of polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The service reported the query complete
    Complete(StatusSnapshot),
    /// The limit was reached and the query was stopped; rows may be partial
    StoppedEarly(StatusSnapshot),
}

impl PollOutcome {
    pub fn snapshot(&self) -> &StatusSnapshot {
        match self {
            PollOutcome::Complete(snapshot) => snapshot,
            PollOutcome::StoppedEarly(snapshot) => snapshot,
        }
    }

    pub fn into_snapshot(self) -> StatusSnapshot {
        match self {
            PollOutcome::Complete(snapshot) => snapshot,
            PollOutcome::StoppedEarly(snapshot) => snapshot,
        }
    }

    pub fn stopped_early(&self) -> bool {
        matches!(self, PollOutcome::StoppedEarly(_))
    }
}

/// Ways polling can fail
#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to read status of query {handle}")]
    Transport {
        handle: JobHandle,
        #[source]
        source: ClientError,
    },

    #[error("query {handle} failed")]
    JobFailed {
        handle: JobHandle,
        snapshot: StatusSnapshot,
    },

    #[error("query {handle} was cancelled")]
    JobCancelled {
        handle: JobHandle,
        snapshot: StatusSnapshot,
    },

    #[error("query {handle} reported unknown status '{label}'")]
    UnknownStatus { handle: JobHandle, label: String },

    #[error(
        "failed to stop query {handle} after {} row(s) arrived",
        .last_snapshot.row_count()
    )]
    CancelRequestFailed {
        handle: JobHandle,
        #[source]
        source: ClientError,
        last_snapshot: StatusSnapshot,
    },
}

impl PollError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            PollError::Transport { .. } => exit::TRANSPORT,
            PollError::JobFailed { .. } => exit::JOB_FAILED,
            PollError::JobCancelled { .. } => exit::JOB_CANCELLED,
            PollError::UnknownStatus { .. } => exit::UNKNOWN_STATUS,
            PollError::CancelRequestFailed { .. } => exit::CANCEL_FAILED,
        }
    }
}

/// What to do after one probe
enum Transition {
    Wait,
    StopEarly(StatusSnapshot),
    Finish(StatusSnapshot),
    Fail(PollError),
}

/// Polls one query at a time to completion
pub struct QueryPoller {
    prober: Arc<dyn StatusProber>,
    canceller: Arc<dyn JobCanceller>,
    delay: Arc<dyn Delay>,
    policy: PollPolicy,
}

impl QueryPoller {
    /// Creates a new poller
    pub fn new(
        prober: Arc<dyn StatusProber>,
        canceller: Arc<dyn JobCanceller>,
        delay: Arc<dyn Delay>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            prober,
            canceller,
            delay,
            policy,
        }
    }

    /// Polls the job until it reaches a terminal outcome
    pub async fn poll(&self, handle: &JobHandle) -> Result<PollOutcome, PollError> {
        info!(
            "Polling query {} (interval: {:?}, limit: {})",
            handle, self.policy.interval, self.policy.limit
        );

        let mut probes: u64 = 0;

        loop {
            let snapshot = self
                .prober
                .probe(handle)
                .await
                .map_err(|source| PollError::Transport {
                    handle: handle.clone(),
                    source,
                })?;
            probes += 1;

            debug!(
                "Probe {} of query {}: {} with {} row(s)",
                probes,
                handle,
                snapshot.status,
                snapshot.row_count()
            );

            match self.transition(handle, snapshot) {
                Transition::Wait => {
                    self.delay.wait(self.policy.interval).await;
                }
                Transition::Finish(snapshot) => {
                    info!(
                        "Query {} complete with {} row(s) after {} probe(s)",
                        handle,
                        snapshot.row_count(),
                        probes
                    );
                    return Ok(PollOutcome::Complete(snapshot));
                }
                Transition::StopEarly(snapshot) => {
                    return self.stop_early(handle, snapshot).await;
                }
                Transition::Fail(err) => {
                    warn!("Query {} ended after {} probe(s): {}", handle, probes, err);
                    return Err(err);
                }
            }
        }
    }

    /// Classifies one snapshot
    fn transition(&self, handle: &JobHandle, snapshot: StatusSnapshot) -> Transition {
        if self.policy.should_stop_early(&snapshot) {
            return Transition::StopEarly(snapshot);
        }

        match snapshot.status {
            QueryStatus::Scheduled | QueryStatus::Running => Transition::Wait,
            QueryStatus::Complete => Transition::Finish(snapshot),
            QueryStatus::Failed => Transition::Fail(PollError::JobFailed {
                handle: handle.clone(),
                snapshot,
            }),
            QueryStatus::Cancelled => Transition::Fail(PollError::JobCancelled {
                handle: handle.clone(),
                snapshot,
            }),
            QueryStatus::Unrecognized(ref label) => Transition::Fail(PollError::UnknownStatus {
                handle: handle.clone(),
                label: label.clone(),
            }),
        }
    }

    /// Stops a query that already produced enough rows
    async fn stop_early(
        &self,
        handle: &JobHandle,
        snapshot: StatusSnapshot,
    ) -> Result<PollOutcome, PollError> {
        info!(
            "Query {} reached {} row(s) while {}, stopping it",
            handle,
            snapshot.row_count(),
            snapshot.status
        );

        match self.canceller.cancel(handle).await {
            Ok(_) => Ok(PollOutcome::StoppedEarly(snapshot)),
            Err(source) => {
                warn!("Failed to stop query {}: {}", handle, source);
                Err(PollError::CancelRequestFailed {
                    handle: handle.clone(),
                    source,
                    last_snapshot: snapshot,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use insight_client::CancelAck;
    use insight_core::{ResultField, ResultRow};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays a fixed sequence of probe results
    struct ScriptedProber {
        script: Mutex<VecDeque<insight_client::Result<StatusSnapshot>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProber {
        fn new(script: Vec<insight_client::Result<StatusSnapshot>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusProber for ScriptedProber {
        async fn probe(&self, _handle: &JobHandle) -> insight_client::Result<StatusSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("probed more often than scripted")
        }
    }

    struct FakeCanceller {
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeCanceller {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobCanceller for FakeCanceller {
        async fn cancel(&self, handle: &JobHandle) -> insight_client::Result<CancelAck> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ClientError::transport("StopQuery", "connection reset"))
            } else {
                Ok(CancelAck {
                    handle: handle.clone(),
                })
            }
        }
    }

    #[derive(Default)]
    struct RecordingDelay {
        waits: Mutex<Vec<Duration>>,
    }

    impl RecordingDelay {
        fn count(&self) -> usize {
            self.waits.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn wait(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    fn rows(n: usize) -> Vec<ResultRow> {
        (0..n)
            .map(|i| ResultRow::new(vec![ResultField::new("@message", format!("line {}", i))]))
            .collect()
    }

    fn snap(status: QueryStatus, n: usize) -> insight_client::Result<StatusSnapshot> {
        Ok(StatusSnapshot::new(status, rows(n)))
    }

    struct Harness {
        prober: Arc<ScriptedProber>,
        canceller: Arc<FakeCanceller>,
        delay: Arc<RecordingDelay>,
        poller: QueryPoller,
    }

    fn harness(
        script: Vec<insight_client::Result<StatusSnapshot>>,
        canceller: Arc<FakeCanceller>,
        policy: PollPolicy,
    ) -> Harness {
        let prober = ScriptedProber::new(script);
        let delay = Arc::new(RecordingDelay::default());
        let poller = QueryPoller::new(prober.clone(), canceller.clone(), delay.clone(), policy);
        Harness {
            prober,
            canceller,
            delay,
            poller,
        }
    }

    fn handle() -> JobHandle {
        JobHandle::new("query-1")
    }

    #[tokio::test]
    async fn test_complete_on_first_probe() {
        let h = harness(
            vec![snap(QueryStatus::Complete, 3)],
            FakeCanceller::ok(),
            PollPolicy::new(10),
        );

        let outcome = h.poller.poll(&handle()).await.unwrap();

        assert!(!outcome.stopped_early());
        assert_eq!(outcome.into_snapshot().rows, rows(3));
        assert_eq!(h.prober.calls(), 1);
        assert_eq!(h.canceller.calls(), 0);
        // No wait before returning a terminal outcome
        assert_eq!(h.delay.count(), 0);
    }

    #[tokio::test]
    async fn test_scheduled_then_complete() {
        let n = 4;
        let mut script: Vec<_> = (0..n).map(|_| snap(QueryStatus::Scheduled, 0)).collect();
        script.push(snap(QueryStatus::Complete, 2));

        let h = harness(script, FakeCanceller::ok(), PollPolicy::new(10));
        let outcome = h.poller.poll(&handle()).await.unwrap();

        assert_eq!(
            outcome,
            PollOutcome::Complete(StatusSnapshot::new(QueryStatus::Complete, rows(2)))
        );
        assert_eq!(h.prober.calls(), n + 1);
        assert_eq!(h.canceller.calls(), 0);
        assert_eq!(h.delay.count(), n);
    }

    #[tokio::test]
    async fn test_waits_use_policy_interval() {
        let h = harness(
            vec![snap(QueryStatus::Scheduled, 0), snap(QueryStatus::Complete, 0)],
            FakeCanceller::ok(),
            PollPolicy::new(10).with_interval(Duration::from_millis(250)),
        );

        h.poller.poll(&handle()).await.unwrap();

        assert_eq!(
            *h.delay.waits.lock().unwrap(),
            vec![Duration::from_millis(250)]
        );
    }

    #[tokio::test]
    async fn test_running_below_limit_keeps_polling() {
        let h = harness(
            vec![
                snap(QueryStatus::Running, 1),
                snap(QueryStatus::Running, 4),
                snap(QueryStatus::Complete, 5),
            ],
            FakeCanceller::ok(),
            PollPolicy::new(5),
        );

        let outcome = h.poller.poll(&handle()).await.unwrap();

        assert!(!outcome.stopped_early());
        assert_eq!(outcome.snapshot().row_count(), 5);
        assert_eq!(h.prober.calls(), 3);
        assert_eq!(h.canceller.calls(), 0);
    }

    #[tokio::test]
    async fn test_running_at_limit_stops_early() {
        let h = harness(
            vec![snap(QueryStatus::Running, 2), snap(QueryStatus::Running, 5)],
            FakeCanceller::ok(),
            PollPolicy::new(5),
        );

        let outcome = h.poller.poll(&handle()).await.unwrap();

        assert!(outcome.stopped_early());
        let snapshot = outcome.into_snapshot();
        assert_eq!(snapshot.status, QueryStatus::Running);
        assert_eq!(snapshot.rows, rows(5));
        assert_eq!(h.prober.calls(), 2);
        assert_eq!(h.canceller.calls(), 1);
    }

    #[tokio::test]
    async fn test_running_above_limit_stops_early() {
        let h = harness(
            vec![snap(QueryStatus::Running, 12)],
            FakeCanceller::ok(),
            PollPolicy::new(10),
        );

        let outcome = h.poller.poll(&handle()).await.unwrap();

        assert!(outcome.stopped_early());
        assert_eq!(outcome.snapshot().row_count(), 12);
        assert_eq!(h.canceller.calls(), 1);
    }

    #[tokio::test]
    async fn test_scheduled_never_stops_early_by_default() {
        let h = harness(
            vec![snap(QueryStatus::Scheduled, 10), snap(QueryStatus::Complete, 10)],
            FakeCanceller::ok(),
            PollPolicy::new(1),
        );

        let outcome = h.poller.poll(&handle()).await.unwrap();

        assert!(!outcome.stopped_early());
        assert_eq!(h.canceller.calls(), 0);
        assert_eq!(h.prober.calls(), 2);
    }

    #[tokio::test]
    async fn test_scheduled_stops_early_when_enabled() {
        let h = harness(
            vec![snap(QueryStatus::Scheduled, 3)],
            FakeCanceller::ok(),
            PollPolicy::new(3).with_early_stop_on_scheduled(true),
        );

        let outcome = h.poller.poll(&handle()).await.unwrap();

        assert!(outcome.stopped_early());
        assert_eq!(h.canceller.calls(), 1);
    }

    #[tokio::test]
    async fn test_running_early_stop_can_be_disabled() {
        let h = harness(
            vec![snap(QueryStatus::Running, 8), snap(QueryStatus::Complete, 9)],
            FakeCanceller::ok(),
            PollPolicy::new(5).with_early_stop_on_running(false),
        );

        let outcome = h.poller.poll(&handle()).await.unwrap();

        assert!(!outcome.stopped_early());
        assert_eq!(outcome.snapshot().row_count(), 9);
        assert_eq!(h.canceller.calls(), 0);
    }

    #[tokio::test]
    async fn test_complete_at_limit_does_not_cancel() {
        let h = harness(
            vec![snap(QueryStatus::Complete, 10)],
            FakeCanceller::ok(),
            PollPolicy::new(10),
        );

        let outcome = h.poller.poll(&handle()).await.unwrap();

        assert!(!outcome.stopped_early());
        assert_eq!(h.canceller.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_failure_is_reported() {
        let h = harness(
            vec![snap(QueryStatus::Running, 5)],
            FakeCanceller::failing(),
            PollPolicy::new(5),
        );

        let err = h.poller.poll(&handle()).await.unwrap_err();

        match &err {
            PollError::CancelRequestFailed {
                handle: failed,
                source,
                last_snapshot,
            } => {
                assert_eq!(failed, &handle());
                assert!(source.is_transport());
                assert_eq!(last_snapshot.row_count(), 5);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.exit_code(), exit::CANCEL_FAILED);
        // Cancellation is attempted once and polling does not resume
        assert_eq!(h.canceller.calls(), 1);
        assert_eq!(h.prober.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_status() {
        let h = harness(
            vec![snap(QueryStatus::Scheduled, 0), snap(QueryStatus::Failed, 0)],
            FakeCanceller::ok(),
            PollPolicy::new(10),
        );

        let err = h.poller.poll(&handle()).await.unwrap_err();

        assert!(matches!(err, PollError::JobFailed { .. }));
        assert_eq!(err.exit_code(), exit::JOB_FAILED);
        assert_eq!(h.prober.calls(), 2);
        assert_eq!(h.canceller.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_status() {
        let h = harness(
            vec![snap(QueryStatus::Cancelled, 7)],
            FakeCanceller::ok(),
            PollPolicy::new(5),
        );

        let err = h.poller.poll(&handle()).await.unwrap_err();

        assert!(matches!(err, PollError::JobCancelled { .. }));
        assert_eq!(err.to_string(), "query query-1 was cancelled");
        assert_eq!(h.prober.calls(), 1);
        assert_eq!(h.canceller.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_status_keeps_label() {
        let h = harness(
            vec![snap(QueryStatus::from_label("Pending"), 0)],
            FakeCanceller::ok(),
            PollPolicy::new(5),
        );

        let err = h.poller.poll(&handle()).await.unwrap_err();

        match &err {
            PollError::UnknownStatus { label, .. } => assert_eq!(label, "Pending"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("'Pending'"));
        assert_eq!(h.prober.calls(), 1);
    }

    #[tokio::test]
    async fn test_probe_error_aborts_without_cancel() {
        let h = harness(
            vec![
                snap(QueryStatus::Running, 9),
                Err(ClientError::transport("GetQueryResults", "timed out")),
            ],
            FakeCanceller::ok(),
            PollPolicy::new(10),
        );

        let err = h.poller.poll(&handle()).await.unwrap_err();

        assert!(matches!(err, PollError::Transport { .. }));
        assert_eq!(err.exit_code(), exit::TRANSPORT);
        assert_eq!(h.prober.calls(), 2);
        assert_eq!(h.canceller.calls(), 0);
    }

    #[tokio::test]
    async fn test_repeated_scheduled_never_terminates_alone() {
        let n = 200;
        let mut script: Vec<_> = (0..n).map(|_| snap(QueryStatus::Scheduled, 0)).collect();
        script.push(snap(QueryStatus::Running, 0));
        script.push(snap(QueryStatus::Complete, 0));

        let h = harness(script, FakeCanceller::ok(), PollPolicy::new(1));
        let outcome = h.poller.poll(&handle()).await.unwrap();

        assert!(matches!(outcome, PollOutcome::Complete(_)));
        assert_eq!(h.prober.calls(), n + 2);
        assert_eq!(h.delay.count(), n + 1);
        assert_eq!(h.canceller.calls(), 0);
    }

    #[test]
    fn test_default_policy() {
        let policy = PollPolicy::new(10);
        assert_eq!(policy.interval, Duration::from_secs(5));
        assert!(policy.early_stop_on_running);
        assert!(!policy.early_stop_on_scheduled);
    }
}
