// File: terrapin/src/orchestrator/clock.rs
//
// Clock Abstraction
//
// Every delay a fixture introduces (confirmation waits, mocked network
// latency) goes through this trait so tests can run against paused tokio time.

use std::future::Future;
use std::pin::Pin;
use tokio::time::{self, Duration, Instant};

/// Source of time for fixture delays
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use tokio::time::Duration;
/// use tortoise_terrapin::orchestrator::clock::{Clock, PausedClock};
///
/// #[tokio::test]
/// async fn confirmation_delay_is_instant() {
///     let clock = Arc::new(PausedClock::new());
///     let start = clock.now();
///
///     // Three confirmations of one second each
///     clock.sleep(Duration::from_secs(3)).await;
///
///     assert_eq!(clock.now() - start, Duration::from_secs(3));
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current instant
    fn now(&self) -> Instant;

    /// Sleeps for the specified duration
    ///
    /// Under a paused runtime the sleep completes as soon as the runtime
    /// auto-advances or `PausedClock::advance` moves past the deadline.
    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Wall-clock time, used when a fixture is driven against a live node
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        time::Instant::now()
    }

    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(time::sleep(d))
    }
}

/// Paused clock
///
/// Works with tokio's `time::pause()`: time only moves when `advance()` is
/// called or when the runtime has nothing else to do and auto-advances to
/// the next pending timer.
///
/// Must be created inside a current-thread runtime, typically a plain
/// `#[tokio::test]`.
pub struct PausedClock;

impl PausedClock {
    /// Creates a new PausedClock and pauses tokio time
    ///
    /// Panics if time is already paused, so do not combine it with
    /// `start_paused = true`; `SystemClock` is already paused there since it
    /// reads tokio time too.
    pub fn new() -> Self {
        time::pause();
        Self
    }

    /// Manually advance time by the specified duration
    ///
    /// Pending sleeps whose deadline falls inside the advanced window wake up.
    pub async fn advance(&self, d: Duration) {
        time::advance(d).await
    }
}

impl Clock for PausedClock {
    fn now(&self) -> Instant {
        time::Instant::now()
    }

    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(time::sleep(d))
    }
}

impl Default for PausedClock {
    fn default() -> Self {
        Self::new()
    }
}
