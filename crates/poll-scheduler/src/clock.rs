//! Wall-clock source

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current wall-clock time in Unix seconds
pub trait Clock: Send + Sync {
    fn now_epoch_secs(&self) -> f64;
}

/// The system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_secs(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    // f64 bits
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(epoch_secs: f64) -> Self {
        Self {
            now: AtomicU64::new(epoch_secs.to_bits()),
        }
    }

    pub fn set(&self, epoch_secs: f64) {
        self.now.store(epoch_secs.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.set(self.now_epoch_secs() + by.as_secs_f64());
    }
}

impl Clock for ManualClock {
    fn now_epoch_secs(&self) -> f64 {
        f64::from_bits(self.now.load(Ordering::SeqCst))
    }
}
