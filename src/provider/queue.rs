//! FIFO request queue pacing outbound calls to the statistics provider.
//!
//! Every call is wrapped as a job and executed one at a time by a single drain
//! task. Before each dispatch the queue consults a trailing one-minute and
//! one-hour window of dispatch times and waits when either cap is reached. A
//! job that fails with a rate-limit signal triggers an exponential backoff
//! before the next dispatch; the failure itself is delivered to the caller
//! unchanged and the job is never retried by the queue.

use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use futures::future::BoxFuture;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tokio::{
    sync::oneshot,
    time::{Instant, sleep},
};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::window::RateWindow;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);

/// Classifies a task failure as a provider rate-limit rejection.
pub trait RateLimitSignal {
    /// `true` when the provider refused the call for rate.
    fn is_rate_limited(&self) -> bool;
}

/// Whether an error message reads like a rate-limit rejection.
pub fn mentions_rate_limit(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("too many requests") || lower.contains("rate limit")
}

/// The job was dropped before it produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request queue dropped the task before it completed")]
pub struct QueueClosed;

/// Pacing parameters, fixed when the queue is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Trailing-minute request cap.
    pub max_requests_per_minute: usize,
    /// Trailing-hour request cap.
    pub max_requests_per_hour: usize,
    /// First backoff after a rate-limit signal.
    pub base_delay: Duration,
    /// Ceiling for the exponential backoff.
    pub max_delay: Duration,
    /// Pause inserted after every dispatch, whatever its outcome.
    pub dispatch_spacing: Duration,
    /// Upper bound of the random delay added to a backoff.
    pub max_jitter: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests_per_minute: 10,
            max_requests_per_hour: 100,
            base_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(30_000),
            dispatch_spacing: Duration::from_millis(100),
            max_jitter: Duration::from_millis(1_000),
        }
    }
}

impl RateLimitConfig {
    /// `min(base * 2^attempts, max)`, without jitter.
    pub fn backoff_delay(&self, attempts: u32) -> Duration {
        2u32.checked_pow(attempts)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    fn jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}

/// Snapshot of the queue used by status endpoints and throttling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct QueueStatus {
    /// Jobs waiting to run.
    pub queue_length: usize,
    /// The worker is draining the queue.
    pub is_processing: bool,
    /// A job is running right now.
    pub in_flight: bool,
    /// Requests started in the trailing minute.
    pub requests_last_minute: usize,
    /// Requests started in the trailing hour.
    pub requests_last_hour: usize,
    /// Rate-limit signals since the last clean job.
    pub consecutive_rate_limits: u32,
}

enum Outcome {
    Completed,
    Failed,
    RateLimited,
}

type Job = Box<dyn FnOnce() -> BoxFuture<'static, Outcome> + Send>;

enum Step {
    Idle,
    Wait {
        delay: Duration,
        window: &'static str,
        count: usize,
    },
    Dispatch(Job),
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Job>,
    window: RateWindow,
    processing: bool,
    in_flight: bool,
    consecutive_rate_limits: u32,
}

struct Inner {
    config: RateLimitConfig,
    state: Mutex<QueueState>,
}

/// Cloneable handle to a shared request queue.
#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<Inner>,
}

impl RequestQueue {
    /// Spawn the worker and return a handle to it.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    /// Limits the queue was built with.
    pub fn config(&self) -> &RateLimitConfig {
        &self.inner.config
    }

    /// Enqueue `task` and return a future resolving with its own result.
    ///
    /// The task is enqueued before this returns, so submission order is
    /// execution order. Dropping the returned future does not cancel the task.
    pub fn submit<F, Fut, T, E>(&self, task: F) -> impl Future<Output = Result<T, E>> + Send + 'static
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: RateLimitSignal + From<QueueClosed> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || -> BoxFuture<'static, Outcome> {
            Box::pin(async move {
                let result = task().await;
                let outcome = match &result {
                    Ok(_) => Outcome::Completed,
                    Err(err) if err.is_rate_limited() => Outcome::RateLimited,
                    Err(_) => Outcome::Failed,
                };
                let _ = tx.send(result);
                outcome
            })
        });

        self.enqueue(job);

        async move { rx.await.unwrap_or_else(|_| Err(E::from(QueueClosed))) }
    }

    /// Current queue length, processing flags and trailing window counts.
    pub fn status(&self) -> QueueStatus {
        let state = self.inner.lock();
        let now = Instant::now();
        QueueStatus {
            queue_length: state.pending.len(),
            is_processing: state.processing,
            in_flight: state.in_flight,
            requests_last_minute: state.window.count_within(now, MINUTE),
            requests_last_hour: state.window.count_within(now, HOUR),
            consecutive_rate_limits: state.consecutive_rate_limits,
        }
    }

    fn enqueue(&self, job: Job) {
        let start_drain = {
            let mut state = self.inner.lock();
            state.pending.push_back(job);
            !std::mem::replace(&mut state.processing, true)
        };

        if start_drain {
            tokio::spawn(drain(self.inner.clone()));
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_step(&self) -> Step {
        let mut state = self.lock();
        let now = Instant::now();
        state.window.prune(now, HOUR);

        if state.pending.is_empty() {
            state.processing = false;
            return Step::Idle;
        }

        let last_minute = state.window.count_within(now, MINUTE);
        if last_minute >= self.config.max_requests_per_minute {
            return Step::Wait {
                delay: MINUTE,
                window: "minute",
                count: last_minute,
            };
        }

        let last_hour = state.window.len();
        if last_hour >= self.config.max_requests_per_hour {
            return Step::Wait {
                delay: HOUR,
                window: "hour",
                count: last_hour,
            };
        }

        match state.pending.pop_front() {
            Some(job) => {
                state.window.record(now);
                state.in_flight = true;
                Step::Dispatch(job)
            }
            None => {
                state.processing = false;
                Step::Idle
            }
        }
    }

    /// Record a finished job and return the backoff owed before the next one.
    fn finish(&self, outcome: Outcome) -> Option<Duration> {
        let mut state = self.lock();
        state.in_flight = false;
        match outcome {
            Outcome::RateLimited => {
                let attempts = state.consecutive_rate_limits;
                state.consecutive_rate_limits = attempts.saturating_add(1);
                Some(self.config.backoff_delay(attempts) + self.config.jitter())
            }
            Outcome::Completed | Outcome::Failed => {
                state.consecutive_rate_limits = 0;
                None
            }
        }
    }
}

async fn drain(inner: Arc<Inner>) {
    debug!("request queue drain started");
    loop {
        match inner.next_step() {
            Step::Idle => {
                debug!("request queue drained");
                return;
            }
            Step::Wait {
                delay,
                window,
                count,
            } => {
                info!(
                    window,
                    count,
                    wait_secs = delay.as_secs(),
                    "provider request cap reached; waiting"
                );
                sleep(delay).await;
            }
            Step::Dispatch(job) => {
                let outcome = match tokio::spawn(job()).await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        warn!(error = %err, "queued provider task aborted");
                        Outcome::Failed
                    }
                };

                if let Some(delay) = inner.finish(outcome) {
                    warn!(
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "provider rate limited the request; backing off"
                    );
                    sleep(delay).await;
                }

                sleep(inner.config.dispatch_spacing).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use futures::future::join_all;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum TestError {
        RateLimited,
        Boom,
        Closed,
    }

    impl RateLimitSignal for TestError {
        fn is_rate_limited(&self) -> bool {
            matches!(self, TestError::RateLimited)
        }
    }

    impl From<QueueClosed> for TestError {
        fn from(_: QueueClosed) -> Self {
            TestError::Closed
        }
    }

    fn config() -> RateLimitConfig {
        RateLimitConfig {
            max_requests_per_minute: 100,
            max_requests_per_hour: 1_000,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            dispatch_spacing: Duration::from_millis(100),
            max_jitter: Duration::ZERO,
        }
    }

    type Stamps = Arc<Mutex<Vec<Instant>>>;

    fn stamp(stamps: &Stamps) {
        stamps.lock().unwrap().push(Instant::now());
    }

    #[tokio::test(start_paused = true)]
    async fn tasks_run_in_submission_order_with_their_own_outcome() {
        let queue = RequestQueue::new(config());
        let order = Arc::new(Mutex::new(Vec::new()));

        let futures: Vec<_> = (0..5usize)
            .map(|i| {
                let order = order.clone();
                queue.submit(move || async move {
                    order.lock().unwrap().push(i);
                    if i == 2 {
                        Err(TestError::Boom)
                    } else {
                        Ok(i * 10)
                    }
                })
            })
            .collect();

        let results = join_all(futures).await;
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(
            results,
            vec![Ok(0), Ok(10), Err(TestError::Boom), Ok(30), Ok(40)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn minute_cap_delays_next_dispatch() {
        let queue = RequestQueue::new(RateLimitConfig {
            max_requests_per_minute: 2,
            ..config()
        });
        let stamps: Stamps = Arc::default();

        let futures: Vec<_> = (0..3)
            .map(|_| {
                let stamps = stamps.clone();
                queue.submit(move || async move {
                    stamp(&stamps);
                    Ok::<_, TestError>(())
                })
            })
            .collect();
        join_all(futures).await;

        let stamps = stamps.lock().unwrap();
        assert!(stamps[1] - stamps[0] < Duration::from_secs(1));
        assert!(stamps[2] - stamps[0] >= MINUTE);
    }

    #[tokio::test(start_paused = true)]
    async fn minute_window_never_exceeds_cap() {
        let cap = 3;
        let queue = RequestQueue::new(RateLimitConfig {
            max_requests_per_minute: cap,
            ..config()
        });
        let stamps: Stamps = Arc::default();

        let futures: Vec<_> = (0..10)
            .map(|_| {
                let stamps = stamps.clone();
                queue.submit(move || async move {
                    stamp(&stamps);
                    Ok::<_, TestError>(())
                })
            })
            .collect();
        join_all(futures).await;

        let stamps = stamps.lock().unwrap();
        for (i, start) in stamps.iter().enumerate() {
            let within = stamps[i..]
                .iter()
                .take_while(|s| s.duration_since(*start) < MINUTE)
                .count();
            assert!(within <= cap, "{within} dispatches inside one minute");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hour_cap_waits_an_hour() {
        let queue = RequestQueue::new(RateLimitConfig {
            max_requests_per_hour: 3,
            ..config()
        });
        let stamps: Stamps = Arc::default();

        let futures: Vec<_> = (0..4)
            .map(|_| {
                let stamps = stamps.clone();
                queue.submit(move || async move {
                    stamp(&stamps);
                    Ok::<_, TestError>(())
                })
            })
            .collect();
        join_all(futures).await;

        let stamps = stamps.lock().unwrap();
        assert!(stamps[3] - stamps[0] >= HOUR);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_task_backs_off_and_is_not_retried() {
        let queue = RequestQueue::new(config());
        let stamps: Stamps = Arc::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = {
            let stamps = stamps.clone();
            let calls = calls.clone();
            queue.submit(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                stamp(&stamps);
                Err::<(), _>(TestError::RateLimited)
            })
        };
        let second = {
            let stamps = stamps.clone();
            queue.submit(move || async move {
                stamp(&stamps);
                Ok::<_, TestError>(())
            })
        };

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first, Err(TestError::RateLimited));
        assert_eq!(second, Ok(()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stamps = stamps.lock().unwrap();
        assert!(stamps[1] - stamps[0] >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_rate_limits_grow_the_backoff() {
        let queue = RequestQueue::new(config());
        let stamps: Stamps = Arc::default();

        let futures: Vec<_> = (0..3)
            .map(|i| {
                let stamps = stamps.clone();
                queue.submit(move || async move {
                    stamp(&stamps);
                    if i < 2 {
                        Err(TestError::RateLimited)
                    } else {
                        Ok(())
                    }
                })
            })
            .collect();
        join_all(futures).await;

        let stamps = stamps.lock().unwrap();
        assert!(stamps[1] - stamps[0] >= Duration::from_secs(1));
        assert!(stamps[2] - stamps[1] >= Duration::from_secs(2));
        assert_eq!(queue.status().consecutive_rate_limits, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ordinary_failure_does_not_back_off() {
        let queue = RequestQueue::new(config());
        let stamps: Stamps = Arc::default();

        let first = {
            let stamps = stamps.clone();
            queue.submit(move || async move {
                stamp(&stamps);
                Err::<(), _>(TestError::Boom)
            })
        };
        let second = {
            let stamps = stamps.clone();
            queue.submit(move || async move {
                stamp(&stamps);
                Ok::<_, TestError>(())
            })
        };
        let (first, _) = tokio::join!(first, second);
        assert_eq!(first, Err(TestError::Boom));

        let stamps = stamps.lock().unwrap();
        let gap = stamps[1] - stamps[0];
        assert!(gap >= Duration::from_millis(100));
        assert!(gap < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn at_most_one_task_runs_at_a_time() {
        let queue = RequestQueue::new(config());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let futures: Vec<_> = (0..6)
            .map(|_| {
                let active = active.clone();
                let peak = peak.clone();
                queue.submit(move || async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(50)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, TestError>(())
                })
            })
            .collect();
        join_all(futures).await;

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn status_reflects_backlog_and_idle() {
        let queue = RequestQueue::new(RateLimitConfig {
            max_requests_per_minute: 1,
            ..config()
        });

        let futures: Vec<_> = (0..3)
            .map(|_| queue.submit(|| async { Ok::<_, TestError>(()) }))
            .collect();

        let status = queue.status();
        assert_eq!(status.queue_length, 3);
        assert!(status.is_processing);

        sleep(Duration::from_millis(500)).await;
        let status = queue.status();
        assert_eq!(status.queue_length, 2);
        assert_eq!(status.requests_last_minute, 1);
        assert!(status.is_processing);
        assert!(!status.in_flight);

        join_all(futures).await;
        sleep(Duration::from_millis(200)).await;
        let status = queue.status();
        assert_eq!(status.queue_length, 0);
        assert!(!status.is_processing);
        assert_eq!(status.requests_last_hour, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_caller_does_not_cancel_task() {
        let queue = RequestQueue::new(config());
        let ran = Arc::new(AtomicBool::new(false));

        {
            let ran = ran.clone();
            drop(queue.submit(move || async move {
                ran.store(true, Ordering::SeqCst);
                Ok::<_, TestError>(())
            }));
        }

        queue
            .submit(|| async { Ok::<_, TestError>(()) })
            .await
            .unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn backoff_is_monotone_and_bounded() {
        let config = config();
        assert_eq!(config.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(config.backoff_delay(4), Duration::from_secs(16));
        assert_eq!(config.backoff_delay(5), Duration::from_secs(30));

        let mut previous = Duration::ZERO;
        for attempts in 0..64 {
            let delay = config.backoff_delay(attempts);
            assert!(delay >= previous);
            assert!(delay <= config.max_delay);
            previous = delay;
        }
    }

    #[test]
    fn rate_limit_messages_are_detected() {
        assert!(mentions_rate_limit("429 Too Many Requests"));
        assert!(mentions_rate_limit("provider rate limit exceeded"));
        assert!(!mentions_rate_limit("internal server error"));
    }
}
