//! Reconnect schedule for a broken price subscription

use rand::Rng;
use std::time::Duration;

/// Bounded exponential backoff
///
/// Delays double from `base` up to `max_delay`, each scaled by a random
/// factor in `1 +- jitter`. After `max_attempts` delays the schedule is
/// spent and [`next_delay`](Self::next_delay) returns `None`.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    base: Duration,
    max_delay: Duration,
    jitter: f64,
    max_attempts: u32,
    attempt: u32,
}

impl ReconnectBackoff {
    /// `jitter` is clamped to `0.0..=1.0`
    pub fn new(base: Duration, max_delay: Duration, jitter: f64, max_attempts: u32) -> Self {
        Self {
            base,
            max_delay,
            jitter: if jitter.is_nan() { 0.0 } else { jitter.clamp(0.0, 1.0) },
            max_attempts,
            attempt: 0,
        }
    }

    /// Delay before the next resubscribe, or `None` once the budget is spent
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }

        let doubling = 1u32.checked_shl(self.attempt).unwrap_or(u32::MAX);
        let delay = self.base.saturating_mul(doubling).min(self.max_delay);
        self.attempt += 1;

        Some(self.scatter(delay))
    }

    fn scatter(&self, delay: Duration) -> Duration {
        if self.jitter == 0.0 {
            return delay;
        }
        let scale = rand::thread_rng().gen_range(1.0 - self.jitter..=1.0 + self.jitter);
        Duration::try_from_secs_f64(delay.as_secs_f64() * scale).unwrap_or(self.max_delay)
    }

    /// Restore the full budget; called once quotes flow again
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Delays handed out since the last reset
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
