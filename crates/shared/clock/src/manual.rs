use chrono::{Duration, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use talos_core::Timestamp;
use talos_ports::Clock;

/// Fixed clock that only moves when explicitly advanced or set
///
/// Plan windows are wall-clock intervals, so tests drive them with this
/// clock instead of sleeping.
pub struct ManualClock {
    current: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(start),
        })
    }

    /// Create a clock frozen at the current wall time
    pub fn starting_now() -> Arc<Self> {
        Self::new(Utc::now())
    }

    /// Move time forward
    pub fn advance(&self, duration: Duration) {
        *self.current.write() += duration;
    }

    /// Jump to an explicit time
    ///
    /// Warning: moving backwards can reopen plan windows that already closed.
    pub fn set(&self, time: Timestamp) {
        *self.current.write() = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.read()
    }
}
