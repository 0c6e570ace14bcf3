//! Runner configuration
//!
//! One JSON file drives the whole service:
//!
//! ```json
//! {
//!   "engine": { "poll_interval_ms": 1000 },
//!   "simulator": { "tickers": { "SBER": 250.0 }, "interval_ms": 200, "seed": 7 },
//!   "robots": [
//!     { "owner_user_id": 1, "ticker": "SBER", "buy_price": 249.8, "sell_price": 250.3,
//!       "starts_in_secs": 2, "runs_for_secs": 120 }
//!   ],
//!   "shutdown_mode": "drain",
//!   "shutdown_grace_ms": 5000
//! }
//! ```

use chrono::Duration as ChronoDuration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use talos_core::{NewRobot, Price, Timestamp, UserId, Yield};
use talos_engine::{ConfigError, EngineConfig, ShutdownMode};
use talos_feed::SimulatorConfig;

/// Robot created and activated when the service starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRobot {
    pub owner_user_id: UserId,
    pub ticker: String,
    pub buy_price: Price,
    pub sell_price: Price,
    /// Plan window opens this long after startup
    #[serde(default = "default_starts_in_secs")]
    pub starts_in_secs: i64,
    pub runs_for_secs: i64,
    #[serde(default)]
    pub plan_yield: Yield,
    /// Activate right after creation
    #[serde(default = "default_activate")]
    pub activate: bool,
}

/// Furthest a seed window may start or end from startup (ten years)
const MAX_SEED_OFFSET_SECS: i64 = 10 * 365 * 24 * 60 * 60;

fn default_starts_in_secs() -> i64 {
    2
}

fn default_activate() -> bool {
    true
}

impl SeedRobot {
    /// Draft with its plan window placed relative to `now`
    ///
    /// Fails when the window does not fit in the timestamp range.
    pub fn draft(&self, now: Timestamp) -> Result<NewRobot, ConfigError> {
        let out_of_range = || {
            ConfigError::Invalid(format!(
                "robot window {}s + {}s is out of range",
                self.starts_in_secs, self.runs_for_secs
            ))
        };

        let plan_start = ChronoDuration::try_seconds(self.starts_in_secs)
            .and_then(|offset| now.checked_add_signed(offset))
            .ok_or_else(out_of_range)?;
        let plan_end = ChronoDuration::try_seconds(self.runs_for_secs)
            .and_then(|length| plan_start.checked_add_signed(length))
            .ok_or_else(out_of_range)?;

        Ok(NewRobot::new(
            self.owner_user_id,
            self.ticker.clone(),
            self.buy_price,
            self.sell_price,
            plan_start,
            plan_end,
        )
        .with_plan_yield(self.plan_yield))
    }
}

/// Root configuration for the runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub engine: EngineConfig,
    pub simulator: SimulatorConfig,
    pub robots: Vec<SeedRobot>,
    pub shutdown_mode: ShutdownMode,
    /// Longest wait for running robots on shutdown
    pub shutdown_grace_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            simulator: SimulatorConfig::default(),
            robots: vec![
                SeedRobot {
                    owner_user_id: 1,
                    ticker: "SBER".to_string(),
                    buy_price: dec!(249.8),
                    sell_price: dec!(250.3),
                    starts_in_secs: 2,
                    runs_for_secs: 300,
                    plan_yield: dec!(5),
                    activate: true,
                },
                SeedRobot {
                    owner_user_id: 2,
                    ticker: "GAZP".to_string(),
                    buy_price: dec!(159.9),
                    sell_price: dec!(160.2),
                    starts_in_secs: 2,
                    runs_for_secs: 300,
                    plan_yield: Decimal::ZERO,
                    activate: true,
                },
            ],
            shutdown_mode: ShutdownMode::default(),
            shutdown_grace_ms: 5_000,
        }
    }
}

impl RunnerConfig {
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
        self.engine.validate()?;

        if self.simulator.tickers.is_empty() {
            return Err(ConfigError::Invalid("simulator needs at least one ticker".into()));
        }
        for (i, robot) in self.robots.iter().enumerate() {
            if robot.runs_for_secs <= 0 || robot.runs_for_secs > MAX_SEED_OFFSET_SECS {
                return Err(ConfigError::Invalid(format!(
                    "robots[{}]: runs_for_secs must be within 1..={}",
                    i, MAX_SEED_OFFSET_SECS
                )));
            }
            if robot.starts_in_secs.unsigned_abs() > MAX_SEED_OFFSET_SECS.unsigned_abs() {
                return Err(ConfigError::Invalid(format!(
                    "robots[{}]: starts_in_secs must be within +-{}",
                    i, MAX_SEED_OFFSET_SECS
                )));
            }
            if robot.buy_price >= robot.sell_price {
                return Err(ConfigError::Invalid(format!(
                    "robots[{}]: buy_price {} must be below sell_price {}",
                    i, robot.buy_price, robot.sell_price
                )));
            }
            if !self.simulator.tickers.contains_key(&robot.ticker) {
                log::warn!(
                    "robots[{}]: ticker {} is not simulated, it will never see a quote",
                    i,
                    robot.ticker
                );
            }
        }
        Ok(())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
