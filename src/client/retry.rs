//! Retry coordination for dispatched requests.
//!
//! A [`RetryPolicy`] is built per call and never stored on the client, so
//! concurrent callers can retry the same operation differently. The runner
//! re-attempts only errors marked retryable by the taxonomy (connection,
//! timeout, balancer); a service rejection propagates immediately.
//!
//! Sleeping goes through the [`Sleeper`] trait and every retry is announced
//! to a [`RetryObserver`], so tests can pin down exact delay sequences and
//! embedders can route retry telemetry wherever they like.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::{PubSubError, Result};
use crate::protocol::Operation;

/// How the delay between attempts is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryMode {
    /// The same delay before every retry.
    Static {
        /// Delay slept between attempts.
        delay: Duration,
    },
    /// Exponentially growing delays: the i-th retry (1-based) waits
    /// `factor * 2^(i-2)`, so a factor of 5s yields 2.5s, 5s, 10s, ...
    Backoff {
        /// Base factor the doubling grows from.
        factor: Duration,
    },
}

/// Per-call retry behavior.
///
/// `max_attempts` counts retries after the initial attempt: a policy with
/// `max_attempts = 3` invokes the request at most four times.
///
/// ```
/// use std::time::Duration;
/// use pubsub_http_client::RetryPolicy;
///
/// // Three retries, one second apart.
/// let policy = RetryPolicy::constant(3, Duration::from_secs(1));
/// assert_eq!(policy.max_attempts(), 3);
///
/// // Exponential backoff with a 10s overall deadline.
/// let policy = RetryPolicy::backoff(3, Duration::from_secs(5))
///     .with_deadline(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    mode: RetryMode,
    per_call_timeout: Option<Duration>,
    deadline: Option<Duration>,
}

impl RetryPolicy {
    /// No retries: the request runs exactly once.
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 0,
            mode: RetryMode::Static { delay: Duration::from_secs(60) },
            per_call_timeout: None,
            deadline: None,
        }
    }

    /// Retry up to `max_attempts` times with a fixed delay in between.
    pub fn constant(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            mode: RetryMode::Static { delay },
            per_call_timeout: None,
            deadline: None,
        }
    }

    /// Retry up to `max_attempts` times with exponentially growing delays.
    pub fn backoff(max_attempts: u32, factor: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            mode: RetryMode::Backoff { factor },
            per_call_timeout: None,
            deadline: None,
        }
    }

    /// Override the HTTP timeout for each individual attempt.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.per_call_timeout = Some(timeout);
        self
    }

    /// Bound the whole retried call, sleeps included. When the deadline
    /// elapses the call fails with [`PubSubError::Cancelled`].
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Maximum number of retries after the initial attempt.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The configured delay mode.
    pub fn mode(&self) -> RetryMode {
        self.mode
    }

    /// The per-attempt HTTP timeout override, if any.
    pub fn per_call_timeout(&self) -> Option<Duration> {
        self.per_call_timeout
    }

    /// The overall deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Delay slept before retry number `retries_used + 1`. Backoff growth
    /// saturates at `Duration::MAX` instead of overflowing.
    pub(crate) fn delay_before_retry(&self, retries_used: u32) -> Duration {
        match self.mode {
            RetryMode::Static { delay } => delay,
            RetryMode::Backoff { factor } => {
                let secs = factor.as_secs_f64() * 2f64.powi(retries_used as i32 - 1);
                Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Abstraction over waiting, so retry timing is testable without real
/// delays.
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    /// Resolve after `duration` has passed.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Sleeper that returns immediately. Keeps retry tests fast.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async {})
    }
}

/// Sleeper that records every requested delay without waiting.
#[derive(Debug, Clone, Default)]
pub struct TrackingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl TrackingSleeper {
    /// A tracker with an empty call log.
    pub fn new() -> Self {
        Self::default()
    }

    /// The delays requested so far, in order.
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().expect("sleeper log poisoned").clone()
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        self.calls.lock().expect("sleeper log poisoned").push(duration);
        Box::pin(async {})
    }
}

/// One retry decision, as reported to observers.
#[derive(Debug)]
pub struct RetryAttempt<'a> {
    /// Operation being retried.
    pub operation: &'static str,
    /// Retry number, starting at 1.
    pub attempt: u32,
    /// Delay that will be slept before the retry.
    pub delay: Duration,
    /// The error that triggered the retry.
    pub error: &'a PubSubError,
}

/// Receives a callback for every retry the coordinator schedules.
pub trait RetryObserver: Send + Sync + std::fmt::Debug {
    /// Called after a retryable failure, before the delay is slept.
    fn on_retry(&self, attempt: &RetryAttempt<'_>);
}

/// Default observer: logs each retry at `warn` level via `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn on_retry(&self, attempt: &RetryAttempt<'_>) {
        tracing::warn!(
            "Request failed (attempt {}), retrying [{}] after {:?}: {}",
            attempt.attempt,
            attempt.operation,
            attempt.delay,
            attempt.error
        );
    }
}

/// Observer that drops every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl RetryObserver for SilentObserver {
    fn on_retry(&self, _attempt: &RetryAttempt<'_>) {}
}

/// Drives attempts according to a policy. Owned by the client, shared by
/// every call.
#[derive(Debug, Clone)]
pub(crate) struct RetryRunner {
    pub(crate) sleeper: Arc<dyn Sleeper>,
    pub(crate) observer: Arc<dyn RetryObserver>,
}

impl Default for RetryRunner {
    fn default() -> Self {
        RetryRunner {
            sleeper: Arc::new(TokioSleeper),
            observer: Arc::new(TracingObserver),
        }
    }
}

impl RetryRunner {
    /// Run `make_attempt` under `policy`, honoring `cancel` and the policy
    /// deadline.
    pub(crate) async fn run<F, Fut>(
        &self,
        op: Operation,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
        make_attempt: F,
    ) -> Result<Value>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        match policy.deadline() {
            Some(limit) => {
                match tokio::time::timeout(
                    limit,
                    self.run_attempts(op, policy, cancel, make_attempt),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(PubSubError::Cancelled {
                        operation: op.name(),
                        reason: format!("deadline of {limit:?} elapsed"),
                    }),
                }
            }
            None => self.run_attempts(op, policy, cancel, make_attempt).await,
        }
    }

    async fn run_attempts<F, Fut>(
        &self,
        op: Operation,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
        mut make_attempt: F,
    ) -> Result<Value>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let mut retries_used = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(op));
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(cancelled(op)),
                outcome = make_attempt() => outcome,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retries_used < policy.max_attempts() => {
                    let delay = policy.delay_before_retry(retries_used);
                    self.observer.on_retry(&RetryAttempt {
                        operation: op.name(),
                        attempt: retries_used + 1,
                        delay,
                        error: &e,
                    });
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(cancelled(op)),
                        _ = self.sleeper.sleep(delay) => {}
                    }
                    retries_used += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn cancelled(op: Operation) -> PubSubError {
    PubSubError::Cancelled {
        operation: op.name(),
        reason: "operation cancelled".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Observer recording (attempt, delay) pairs.
    #[derive(Debug, Default, Clone)]
    struct RecordingObserver {
        seen: Arc<Mutex<Vec<(u32, Duration)>>>,
    }

    impl RetryObserver for RecordingObserver {
        fn on_retry(&self, attempt: &RetryAttempt<'_>) {
            self.seen.lock().unwrap().push((attempt.attempt, attempt.delay));
        }
    }

    fn runner_with(sleeper: impl Sleeper + 'static) -> RetryRunner {
        RetryRunner {
            sleeper: Arc::new(sleeper),
            observer: Arc::new(SilentObserver),
        }
    }

    /// Attempt closure failing with a connection error until `succeed_after`
    /// calls have happened.
    fn flaky(
        calls: Arc<AtomicUsize>,
        succeed_after: usize,
    ) -> impl FnMut() -> BoxFuture<'static, Result<Value>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let fut: BoxFuture<'static, Result<Value>> = Box::pin(async move {
                if n < succeed_after {
                    Err(PubSubError::Connection {
                        operation: "sub_pull",
                        detail: format!("connection refused on call {n}"),
                    })
                } else {
                    Ok(Value::Null)
                }
            });
            fut
        }
    }

    #[tokio::test]
    async fn test_static_mode_exhausts_after_max_attempts() {
        let sleeper = TrackingSleeper::new();
        let runner = runner_with(sleeper.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::constant(3, Duration::from_secs(1));

        let outcome = runner
            .run(
                Operation::SubPull,
                &policy,
                &CancellationToken::new(),
                flaky(calls.clone(), usize::MAX),
            )
            .await;

        // One initial attempt plus three retries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(sleeper.calls(), vec![Duration::from_secs(1); 3]);
        assert!(matches!(outcome, Err(PubSubError::Connection { .. })));
    }

    #[tokio::test]
    async fn test_backoff_mode_doubles_delays() {
        let sleeper = TrackingSleeper::new();
        let runner = runner_with(sleeper.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::backoff(3, Duration::from_secs(5));

        let outcome = runner
            .run(
                Operation::SubPull,
                &policy,
                &CancellationToken::new(),
                flaky(calls.clone(), usize::MAX),
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            sleeper.calls(),
            vec![
                Duration::from_millis(2_500),
                Duration::from_secs(5),
                Duration::from_secs(10),
            ]
        );
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_service_error_is_never_retried() {
        let sleeper = TrackingSleeper::new();
        let runner = runner_with(sleeper.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_attempt = calls.clone();
        let policy = RetryPolicy::constant(5, Duration::from_secs(1));

        let outcome = runner
            .run(Operation::TopicCreate, &policy, &CancellationToken::new(), move || {
                calls_in_attempt.fetch_add(1, Ordering::SeqCst);
                let fut: BoxFuture<'static, Result<Value>> = Box::pin(async {
                    Err(PubSubError::Service {
                        operation: "topic_create",
                        code: Some(409),
                        status: Some("ALREADY_EXIST".to_string()),
                        message: "Topic already exists".to_string(),
                    })
                });
                fut
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.calls().is_empty());
        assert!(matches!(outcome, Err(PubSubError::Service { .. })));
    }

    #[tokio::test]
    async fn test_success_stops_retrying() {
        let sleeper = TrackingSleeper::new();
        let runner = runner_with(sleeper.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::constant(5, Duration::from_millis(200));

        let outcome = runner
            .run(
                Operation::SubPull,
                &policy,
                &CancellationToken::new(),
                flaky(calls.clone(), 2),
            )
            .await;

        assert!(outcome.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.calls(), vec![Duration::from_millis(200); 2]);
    }

    #[tokio::test]
    async fn test_zero_attempts_means_single_call() {
        let runner = runner_with(InstantSleeper);
        let calls = Arc::new(AtomicUsize::new(0));

        let outcome = runner
            .run(
                Operation::SubPull,
                &RetryPolicy::none(),
                &CancellationToken::new(),
                flaky(calls.clone(), usize::MAX),
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_observer_sees_every_retry() {
        let observer = RecordingObserver::default();
        let runner = RetryRunner {
            sleeper: Arc::new(InstantSleeper),
            observer: Arc::new(observer.clone()),
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::backoff(2, Duration::from_secs(4));

        let _ = runner
            .run(
                Operation::TopicPublish,
                &policy,
                &CancellationToken::new(),
                flaky(calls.clone(), usize::MAX),
            )
            .await;

        let seen = observer.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![(1, Duration::from_secs(2)), (2, Duration::from_secs(4))]
        );
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_first_attempt() {
        let runner = runner_with(InstantSleeper);
        let calls = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();
        token.cancel();

        let outcome = runner
            .run(
                Operation::SubPull,
                &RetryPolicy::constant(3, Duration::from_secs(1)),
                &token,
                flaky(calls.clone(), usize::MAX),
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(outcome, Err(PubSubError::Cancelled { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_the_whole_call() {
        let runner = RetryRunner::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::constant(1_000, Duration::from_millis(10))
            .with_deadline(Duration::from_millis(45));

        let outcome = runner
            .run(
                Operation::SubPull,
                &policy,
                &CancellationToken::new(),
                flaky(calls.clone(), usize::MAX),
            )
            .await;

        match outcome {
            Err(PubSubError::Cancelled { operation, reason }) => {
                assert_eq!(operation, "sub_pull");
                assert!(reason.contains("deadline"));
            }
            other => panic!("expected cancellation, got {other:?}"),
        }
        // A 45ms deadline with 10ms pauses allows a handful of attempts,
        // nowhere near the configured thousand.
        let seen = calls.load(Ordering::SeqCst);
        assert!(seen >= 2 && seen < 10, "calls: {seen}");
    }

    #[test]
    fn test_delay_table() {
        let policy = RetryPolicy::backoff(4, Duration::from_secs(5));
        assert_eq!(policy.delay_before_retry(0), Duration::from_millis(2_500));
        assert_eq!(policy.delay_before_retry(1), Duration::from_secs(5));
        assert_eq!(policy.delay_before_retry(2), Duration::from_secs(10));
        assert_eq!(policy.delay_before_retry(3), Duration::from_secs(20));

        let policy = RetryPolicy::constant(2, Duration::from_secs(7));
        assert_eq!(policy.delay_before_retry(0), Duration::from_secs(7));
        assert_eq!(policy.delay_before_retry(1), Duration::from_secs(7));
    }

    #[test]
    fn test_delay_saturates_instead_of_overflowing() {
        // 5s * 2^62 is past what Duration can hold.
        let policy = RetryPolicy::backoff(100, Duration::from_secs(5));
        assert_eq!(policy.delay_before_retry(63), Duration::MAX);
        assert_eq!(policy.delay_before_retry(99), Duration::MAX);
    }
}
