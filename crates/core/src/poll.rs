//! Bounded fixed-interval polling.
//!
//! Both backends wait on eventually-consistent remote state: the catalog
//! backend ingests albums some seconds after an artist is created, and the
//! peer backend completes searches asynchronously. [`poll_until`] is the one
//! loop used for both, bounded either by wall-clock time or by an iteration
//! cap, and interruptible through a [`CancellationToken`].

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// When a poll gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollLimit {
    /// Keep checking while less than this much time has elapsed.
    Timeout(Duration),
    /// Check at most this many times.
    MaxIterations(u32),
}

impl PollLimit {
    /// Iteration cap covering `max_wait` at the given interval, rounded up.
    pub fn iterations_for(max_wait: Duration, interval: Duration) -> Self {
        let interval_ms = interval.as_millis().max(1);
        let iterations = max_wait.as_millis().div_ceil(interval_ms);
        PollLimit::MaxIterations(iterations.min(u32::MAX as u128) as u32)
    }
}

/// Constant-interval poll policy. No backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub limit: PollLimit,
}

impl PollPolicy {
    pub fn with_timeout(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            limit: PollLimit::Timeout(timeout),
        }
    }

    pub fn with_max_iterations(interval: Duration, max_iterations: u32) -> Self {
        Self {
            interval,
            limit: PollLimit::MaxIterations(max_iterations),
        }
    }
}

/// Result of a bounded poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The check produced a value.
    Ready(T),
    /// The timeout or iteration cap was reached first.
    Expired,
    /// The cancellation token fired.
    Cancelled,
}

/// Run `check` until it yields `Some`, the limit is reached, or `cancel` fires.
///
/// The check runs first; the interval sleep only follows a check that came
/// back empty, and is skipped after the final allowed iteration. Errors from
/// `check` end the poll immediately.
pub async fn poll_until<T, E, F, Fut>(
    policy: PollPolicy,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let started = Instant::now();
    let mut iteration: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Ok(PollOutcome::Cancelled);
        }

        let within_limit = match policy.limit {
            PollLimit::Timeout(timeout) => started.elapsed() < timeout,
            PollLimit::MaxIterations(max) => iteration < max,
        };
        if !within_limit {
            return Ok(PollOutcome::Expired);
        }

        iteration += 1;
        if let Some(value) = check().await? {
            return Ok(PollOutcome::Ready(value));
        }

        if let PollLimit::MaxIterations(max) = policy.limit {
            if iteration >= max {
                return Ok(PollOutcome::Expired);
            }
        }

        trace!(iteration, interval_ms = policy.interval.as_millis() as u64, "poll miss, sleeping");
        tokio::select! {
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            _ = sleep(policy.interval) => {}
        }
    }
}
