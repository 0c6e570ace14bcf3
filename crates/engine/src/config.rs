//! Engine configuration
//!
//! All fields have defaults, so a config file only needs to name what it
//! overrides:
//!
//! ```json
//! {
//!   "poll_interval_ms": 1000,
//!   "window_guard": "unrestricted",
//!   "feed": { "idle_timeout_ms": 10000, "max_reconnect_attempts": 3 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use talos_core::{Robot, Timestamp};
use thiserror::Error;

use crate::backoff::ReconnectBackoff;
use crate::broadcaster::MAX_OBSERVER_CAPACITY;

/// Errors raised while loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// When owners may flip a robot's active flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowGuard {
    /// Only while the plan window is not open
    ///
    /// This means a robot cannot be deactivated while it is trading.
    #[default]
    RejectInsideWindow,
    /// At any time
    Unrestricted,
}

impl WindowGuard {
    pub fn allows(self, robot: &Robot, now: Timestamp) -> bool {
        match self {
            WindowGuard::RejectInsideWindow => !robot.is_window_open(now),
            WindowGuard::Unrestricted => true,
        }
    }
}

/// Subscription supervision for execution tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedPolicy {
    /// Longest wait for a quote before the subscription counts as dead
    pub idle_timeout_ms: u64,
    /// Resubscribe attempts after a failure; 0 makes any failure terminal
    pub max_reconnect_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Jitter as a fraction of the delay (0.0 to 1.0)
    pub backoff_jitter: f64,
}

impl Default for FeedPolicy {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 30_000,
            max_reconnect_attempts: 5,
            backoff_base_ms: 500,
            backoff_max_ms: 30_000,
            backoff_jitter: 0.1,
        }
    }
}

impl FeedPolicy {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms.max(1))
    }

    /// Fresh backoff state for one task
    pub fn backoff(&self) -> ReconnectBackoff {
        ReconnectBackoff::new(
            Duration::from_millis(self.backoff_base_ms),
            Duration::from_millis(self.backoff_max_ms),
            self.backoff_jitter,
            self.max_reconnect_attempts,
        )
    }
}

/// Root engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between scheduler polls
    pub poll_interval_ms: u64,
    /// Records buffered per observer before the oldest are dropped
    pub observer_capacity: usize,
    pub window_guard: WindowGuard,
    pub feed: FeedPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3_000,
            observer_capacity: 1_024,
            window_guard: WindowGuard::default(),
            feed: FeedPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".into()));
        }
        if self.observer_capacity == 0 || self.observer_capacity > MAX_OBSERVER_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "observer_capacity must be within 1..={}",
                MAX_OBSERVER_CAPACITY
            )));
        }
        if self.feed.idle_timeout_ms == 0 {
            return Err(ConfigError::Invalid("feed.idle_timeout_ms must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.feed.backoff_jitter) {
            return Err(ConfigError::Invalid(format!(
                "feed.backoff_jitter must be within 0.0..=1.0, got {}",
                self.feed.backoff_jitter
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
