//! Deadline-bounded polling.
//!
//! One combinator for every "check, sleep, retry until deadline" loop in the
//! runtime. The step decides when polling is done; the combinator only owns
//! timing.

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Result of one polling step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep<T> {
    /// Stop polling and return this value.
    Ready(T),
    /// Not done yet; sleep and try again if time remains.
    Pending,
}

/// Run `step` until it is ready or `timeout` elapses.
///
/// The first step runs immediately. Between steps the combinator sleeps
/// `interval`, shortened so it never sleeps past the deadline. Each step is
/// bounded by the time left, so a step that hangs is dropped at the
/// deadline. `None` means the deadline passed without a ready step.
pub async fn poll_until<T, F, Fut>(timeout: Duration, interval: Duration, mut step: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PollStep<T>>,
{
    let deadline = Instant::now() + timeout;

    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        if let Ok(PollStep::Ready(value)) = tokio::time::timeout(left, step()).await {
            return Some(value);
        }

        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        sleep(interval.min(deadline - now)).await;
    }
}
