//! Indefinite URL-condition polling
//!
//! The site under automation is driven by a real user sitting next to the
//! tool: they switch tabs, log in by hand, fill external forms, and close
//! the window when they are done. Waiting for them must therefore tolerate
//! transient CDP failures (a momentarily destroyed execution context is
//! normal during manual navigation) and must never turn "the user closed
//! the tab" into a failure.
//!
//! The poller is generic over the URL probe so the retry and abort
//! semantics are testable without a browser; production code passes a
//! probe backed by the live page.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::Result;

/// How often the poller samples the page URL.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Emit a "still waiting" log line every this many checks.
pub const DEFAULT_LOG_EVERY: u32 = 30;

/// Options for a single wait operation.
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Pause between URL samples (default: 1s)
    pub interval: Duration,
    /// Log progress every N checks; 0 disables progress logging
    pub log_every: u32,
    /// Overall deadline. `None` waits indefinitely, which is the normal
    /// mode; a deadline yields [`WaitOutcome::TimedOut`] when it elapses.
    pub deadline: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            log_every: DEFAULT_LOG_EVERY,
            deadline: None,
        }
    }
}

impl PollOptions {
    /// Indefinite wait with a custom sampling interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Bounded wait that gives up after `deadline`.
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::default()
        }
    }
}

/// How a wait operation resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The page URL started with the target prefix
    Satisfied,
    /// The shutdown latch was triggered before the condition held
    Aborted,
    /// A bounded wait ran out of time
    TimedOut,
}

/// One-way latch signaling that the run should stop.
///
/// Triggered when the user closes the tab or browser, or on Ctrl-C. Once
/// triggered it never resets; every loop in the crate observes it
/// cooperatively between operations.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Create a fresh, untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the signal. Idempotent.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Whether the signal has been latched.
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once the signal is latched.
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}

/// Wait until the current page URL starts with `prefix`.
///
/// Samples the URL via `probe` every [`PollOptions::interval`]. Probe
/// failures are treated as transient and retried unless they classify as
/// the page having been closed, in which case the latch is triggered and
/// the wait resolves to [`WaitOutcome::Aborted`]. The `description` is
/// used for logging only.
pub async fn wait_for_url_prefix<F, Fut>(
    probe: F,
    prefix: &str,
    signal: &ShutdownSignal,
    opts: PollOptions,
    description: &str,
) -> WaitOutcome
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    info!("{}...", description);
    let started = tokio::time::Instant::now();
    let mut checks: u32 = 0;

    loop {
        if signal.is_triggered() {
            debug!(checks, "wait aborted by shutdown signal");
            return WaitOutcome::Aborted;
        }

        match probe().await {
            Ok(url) => {
                if url.starts_with(prefix) {
                    debug!(checks, url = %url, "wait condition satisfied");
                    return WaitOutcome::Satisfied;
                }
            }
            Err(err) => {
                // The close handler may have latched the signal while the
                // probe was in flight.
                if signal.is_triggered() {
                    return WaitOutcome::Aborted;
                }
                if err.is_page_closed() {
                    info!("page closed while waiting, stopping");
                    signal.trigger();
                    return WaitOutcome::Aborted;
                }
                let msg = err.to_string();
                let short: String = msg.chars().take(100).collect();
                debug!("temporary error while checking URL: {} (retrying)", short);
            }
        }

        checks = checks.saturating_add(1);
        if opts.log_every > 0 && checks % opts.log_every == 0 {
            info!(checks, "{}: still waiting", description);
        }

        if let Some(deadline) = opts.deadline {
            if started.elapsed() >= deadline {
                debug!(checks, "wait deadline elapsed");
                return WaitOutcome::TimedOut;
            }
        }

        tokio::time::sleep(opts.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    const TICK: Duration = Duration::from_millis(5);

    fn fast(opts_deadline: Option<Duration>) -> PollOptions {
        PollOptions {
            interval: TICK,
            log_every: 0,
            deadline: opts_deadline,
        }
    }

    /// Probe that replays a scripted response sequence, repeating the last
    /// entry once the script runs out, and counts invocations.
    fn scripted_probe(
        script: Vec<std::result::Result<&'static str, &'static str>>,
        calls: Arc<AtomicU32>,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = Result<String>> + Send>> {
        let queue = Arc::new(Mutex::new(VecDeque::from(script)));
        move || {
            let queue = queue.clone();
            let calls = calls.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let next = {
                    let mut q = queue.lock().unwrap();
                    if q.len() > 1 {
                        q.pop_front().unwrap()
                    } else {
                        *q.front().expect("script must not be empty")
                    }
                };
                next.map(String::from).map_err(Error::generic)
            })
        }
    }

    #[tokio::test]
    async fn satisfied_on_matching_prefix() {
        let calls = Arc::new(AtomicU32::new(0));
        let probe = scripted_probe(vec![Ok("https://example.org/page")], calls.clone());
        let signal = ShutdownSignal::new();

        let outcome =
            wait_for_url_prefix(probe, "https://example.org", &signal, fast(None), "test").await;

        assert_eq!(outcome, WaitOutcome::Satisfied);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn satisfied_on_third_tick() {
        // Sequence scenario: two non-matching samples, then a match.
        let calls = Arc::new(AtomicU32::new(0));
        let probe = scripted_probe(
            vec![
                Ok("https://example.com"),
                Ok("https://example.com"),
                Ok("https://example.org/page"),
            ],
            calls.clone(),
        );
        let signal = ShutdownSignal::new();

        let outcome =
            wait_for_url_prefix(probe, "https://example.org", &signal, fast(None), "test").await;

        assert_eq!(outcome, WaitOutcome::Satisfied);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn pre_triggered_signal_aborts_without_probing() {
        let calls = Arc::new(AtomicU32::new(0));
        let probe = scripted_probe(vec![Ok("https://example.org")], calls.clone());
        let signal = ShutdownSignal::new();
        signal.trigger();

        let outcome =
            wait_for_url_prefix(probe, "https://example.org", &signal, fast(None), "test").await;

        assert_eq!(outcome, WaitOutcome::Aborted);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn signal_after_first_tick_aborts_before_any_match() {
        // The latch wins even though every later sample would match.
        let calls = Arc::new(AtomicU32::new(0));
        let signal = ShutdownSignal::new();
        let probe = {
            let signal = signal.clone();
            let calls = calls.clone();
            move || {
                let signal = signal.clone();
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        signal.trigger();
                        Ok("https://elsewhere.example".to_string())
                    } else {
                        Ok("https://example.org/deep".to_string())
                    }
                }
            }
        };

        let outcome =
            wait_for_url_prefix(probe, "https://example.org", &signal, fast(None), "test").await;

        assert_eq!(outcome, WaitOutcome::Aborted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let probe = scripted_probe(
            vec![
                Err("Execution context was destroyed"),
                Err("Execution context was destroyed"),
                Err("Cannot find context with specified id"),
                Ok("https://example.org/after-recovery"),
            ],
            calls.clone(),
        );
        let signal = ShutdownSignal::new();

        let outcome =
            wait_for_url_prefix(probe, "https://example.org", &signal, fast(None), "test").await;

        assert_eq!(outcome, WaitOutcome::Satisfied);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(!signal.is_triggered());
    }

    #[tokio::test]
    async fn closed_error_aborts_and_latches_signal() {
        let signal = ShutdownSignal::new();
        let probe = || async { Err(Error::cdp("Target closed")) };

        let outcome =
            wait_for_url_prefix(probe, "https://example.org", &signal, fast(None), "test").await;

        assert_eq!(outcome, WaitOutcome::Aborted);
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn bounded_wait_times_out() {
        let calls = Arc::new(AtomicU32::new(0));
        let probe = scripted_probe(vec![Ok("https://example.com")], calls.clone());
        let signal = ShutdownSignal::new();

        let outcome = wait_for_url_prefix(
            probe,
            "https://example.org",
            &signal,
            fast(Some(Duration::from_millis(30))),
            "test",
        )
        .await;

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn shutdown_signal_is_one_way() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
        signal.trigger();
        assert!(signal.is_triggered());
        signal.trigger();
        assert!(signal.is_triggered());

        // Clones observe the same latch.
        let clone = signal.clone();
        assert!(clone.is_triggered());
    }

    #[test]
    fn triggered_future_resolves_once_latched() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        tokio_test::block_on(signal.triggered());
    }
}
