//! Bounded condition polling.
//!
//! Every wait in the harness except the two drag pauses goes through
//! [`Waiter::until`]: the probe runs at least once, then at a fixed interval
//! until it reports ready or the bound elapses.

use crate::config::Timeouts;
use crate::result::ProbeResult;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Outcome of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check<T> {
    /// Condition holds
    Ready(T),
    /// Condition does not hold yet; describes what was observed
    Pending(String),
}

impl<T> Check<T> {
    /// Check if the condition holds
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// What a waiter saw when it gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elapsed {
    /// Last pending observation
    pub last: String,
    /// Time spent polling
    pub waited_ms: u64,
    /// Probes run
    pub attempts: u32,
}

/// Fixed-interval poller with a total bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waiter {
    timeout: Duration,
    interval: Duration,
}

impl Default for Waiter {
    fn default() -> Self {
        Self::from_timeouts(&Timeouts::default())
    }
}

impl Waiter {
    /// Create a waiter
    #[must_use]
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Expectation bound and interval from configuration
    #[must_use]
    pub const fn from_timeouts(timeouts: &Timeouts) -> Self {
        Self::new(timeouts.expect(), timeouts.poll_interval())
    }

    /// Same interval, different bound
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total bound
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll interval
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `probe` until it is ready.
    ///
    /// Errors returned by the probe abort the wait immediately. On timeout
    /// `on_timeout` turns the last observation into the error to report.
    pub async fn until<T, F, Fut, E>(&self, mut probe: F, on_timeout: E) -> ProbeResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<Check<T>>>,
        E: FnOnce(Elapsed) -> crate::result::ProbeError,
    {
        let start = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let last = match probe().await? {
                Check::Ready(value) => return Ok(value),
                Check::Pending(observed) => observed,
            };

            let waited = start.elapsed();
            if waited >= self.timeout {
                let elapsed = Elapsed {
                    last,
                    waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                    attempts,
                };
                tracing::debug!(
                    waited_ms = elapsed.waited_ms,
                    attempts,
                    last = %elapsed.last,
                    "wait bound elapsed"
                );
                return Err(on_timeout(elapsed));
            }
            sleep(self.interval.min(self.timeout - waited)).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::result::ProbeError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> Waiter {
        Waiter::new(Duration::from_millis(50), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_ready_immediately() {
        let value = fast()
            .until(
                || async { Ok(Check::Ready(7)) },
                |_| ProbeError::driver("unreachable"),
            )
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_ready_after_retries() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;
        let value = fast()
            .until(
                move || async move {
                    let n = calls_ref.fetch_add(1, Ordering::SeqCst);
                    Ok(if n >= 3 {
                        Check::Ready(n)
                    } else {
                        Check::Pending(format!("attempt {n}"))
                    })
                },
                |_| ProbeError::driver("unreachable"),
            )
            .await
            .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn test_timeout_reports_last_observation() {
        let err = fast()
            .until(
                || async { Ok(Check::<()>::Pending("0 matches".into())) },
                |elapsed| ProbeError::AssertionFailed {
                    message: format!("{} after {} attempts", elapsed.last, elapsed.attempts),
                },
            )
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("0 matches"));
    }

    #[tokio::test]
    async fn test_probe_error_aborts() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;
        let err = fast()
            .until(
                move || async move {
                    calls_ref.fetch_add(1, Ordering::SeqCst);
                    Err::<Check<()>, _>(ProbeError::driver("gone"))
                },
                |_| ProbeError::driver("timeout"),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("gone"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_timeout_probes_once() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;
        let waiter = fast().with_timeout(Duration::ZERO);
        let _ = waiter
            .until(
                move || async move {
                    calls_ref.fetch_add(1, Ordering::SeqCst);
                    Ok(Check::<()>::Pending(String::new()))
                },
                |_| ProbeError::driver("timeout"),
            )
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_timeouts() {
        let waiter = Waiter::from_timeouts(&Timeouts::default());
        assert_eq!(waiter.timeout(), Duration::from_secs(5));
        assert_eq!(waiter.interval(), Duration::from_millis(100));
    }
}
