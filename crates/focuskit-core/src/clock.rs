//! Injected monotonic clock sources.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time::Instant;

use crate::model::Millis;

/// Monotonic millisecond clock read by the orchestrator.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> Millis;
}

/// Wall clock measured from construction. Follows tokio's clock, so a
/// paused test runtime moves it along with its timers.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// A clock that only moves when told to. Used by simulations and tests.
#[derive(Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn advance(&self, ms: Millis) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Move to `at`. Never moves backwards.
    pub fn set(&self, at: Millis) {
        self.now.fetch_max(at, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}
