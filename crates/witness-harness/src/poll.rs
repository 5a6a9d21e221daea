//! Bounded polling: wait for a condition with explicit interval and
//! duration bounds.
//!
//! Replaces hidden wall-clock waits with a declared contract: poll
//! condition C at interval I for at most duration D, and fail with a named
//! timeout error carrying what was awaited if the condition never holds.

use std::future::Future;
use std::time::Duration;

use crate::error::HarnessError;

/// The interval/duration bounds for one polled wait.
///
/// Both bounds are first-class and caller-overridable; nothing in the
/// harness waits on an implicit default it does not expose.
#[derive(Debug, Clone, Copy)]
pub struct PollSpec {
    /// How often the condition is probed.
    pub interval: Duration,
    /// The maximum total time to keep probing.
    pub timeout: Duration,
}

impl Default for PollSpec {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
            timeout: Duration::from_secs(10),
        }
    }
}

impl PollSpec {
    /// Create a spec with explicit bounds.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Override the total duration bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the probe interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Poll `probe` until it returns `true`, at `spec.interval`, for at most
/// `spec.timeout`.
///
/// `expected` names the awaited condition in the timeout error. A probe
/// error propagates immediately; there is no retry of failed probes.
pub async fn poll_until<F, Fut>(
    spec: PollSpec,
    expected: &str,
    mut probe: F,
) -> Result<(), HarnessError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, HarnessError>>,
{
    let deadline = tokio::time::Instant::now() + spec.timeout;

    loop {
        if probe().await? {
            return Ok(());
        }

        let now = tokio::time::Instant::now();
        if now >= deadline {
            tracing::debug!(expected, timeout = ?spec.timeout, "poll deadline reached");
            return Err(HarnessError::WaitTimeout {
                expected: expected.to_string(),
                waited: spec.timeout,
            });
        }

        // Never sleep past the deadline; the final probe happens on time.
        let remaining = deadline.saturating_duration_since(now);
        tokio::time::sleep(spec.interval.min(remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick_spec() -> PollSpec {
        PollSpec::new(Duration::from_millis(5), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn returns_immediately_when_condition_already_holds() {
        let calls = AtomicUsize::new(0);
        poll_until(quick_spec(), "already true", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(true) }
        })
        .await
        .expect("should succeed");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn keeps_probing_until_condition_holds() {
        let calls = AtomicUsize::new(0);
        poll_until(quick_spec(), "third probe", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(n >= 2) }
        })
        .await
        .expect("should succeed on the third probe");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn times_out_with_named_error() {
        let spec = PollSpec::new(Duration::from_millis(5), Duration::from_millis(30));
        let err = poll_until(spec, "verified location to appear", || async { Ok(false) })
            .await
            .unwrap_err();

        match err {
            HarnessError::WaitTimeout { expected, waited } => {
                assert_eq!(expected, "verified location to appear");
                assert_eq!(waited, Duration::from_millis(30));
            }
            other => panic!("expected WaitTimeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_error_message_names_the_condition() {
        let spec = PollSpec::new(Duration::from_millis(5), Duration::from_millis(20));
        let err = poll_until(spec, "heading to be visible", || async { Ok(false) })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("heading to be visible"));
    }

    #[tokio::test]
    async fn probe_errors_propagate_without_retry() {
        let calls = AtomicUsize::new(0);
        let result = poll_until(quick_spec(), "never", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(HarnessError::WaitTimeout {
                    expected: "inner failure".into(),
                    waited: Duration::ZERO,
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1, "no retry after a probe error");
    }
}
