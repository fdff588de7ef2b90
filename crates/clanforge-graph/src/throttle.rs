//! Mutation pacing
//!
//! Every remote mutation shares the platform's request budget. [`Throttle`]
//! enforces a fixed gap between consecutive mutations issued through it.
//! One throttle is owned by the provisioning context and shared by
//! reference with every reconciler and the restore engine.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Fixed-delay pacing between remote mutations
#[derive(Debug)]
pub struct Throttle {
    delay: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    /// Create throttle with the given inter-call delay
    #[inline]
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last: Mutex::new(None),
        }
    }

    /// Throttle that never waits (tests, offline tooling)
    #[inline]
    #[must_use]
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Configured delay
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait until the next mutation may be issued, then claim the slot
    ///
    /// The first call never waits. The lock is held across the sleep so
    /// concurrent callers queue up behind each other.
    pub async fn pace(&self) {
        if self.delay.is_zero() {
            return;
        }
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.delay;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(Duration::from_millis(750))
    }
}
