use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::values::{Price, RobotId, Ticker, Timestamp, UserId, Yield};

/// Rejection reasons for a robot draft
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RobotSpecError {
    #[error("Ticker must not be empty")]
    EmptyTicker,

    #[error("Buy price {buy} must be below sell price {sell}")]
    InvertedPrices { buy: Price, sell: Price },

    #[error("Plan start {start} must be before plan end {end}")]
    InvertedWindow { start: Timestamp, end: Timestamp },
}

/// Persisted state of one trading robot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    pub robot_id: RobotId,
    pub owner_user_id: UserId,
    /// Robot this one was cloned from as a favorite
    pub parent_robot_id: Option<RobotId>,
    pub is_favorite: bool,
    pub is_active: bool,
    pub ticker: Ticker,
    /// Buy trigger: buy when the feed's buy price is at or below this
    pub buy_price: Price,
    /// Sell trigger: sell when the feed's sell price is at or above this
    pub sell_price: Price,
    pub plan_start: Timestamp,
    pub plan_end: Timestamp,
    /// Informational target, never enforced
    pub plan_yield: Yield,
    pub fact_yield: Yield,
    pub deals_count: u64,
    pub activated_at: Option<Timestamp>,
    pub deactivated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

/// Robot configuration before storage assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRobot {
    pub owner_user_id: UserId,
    #[serde(default)]
    pub parent_robot_id: Option<RobotId>,
    #[serde(default)]
    pub is_favorite: bool,
    pub ticker: Ticker,
    pub buy_price: Price,
    pub sell_price: Price,
    pub plan_start: Timestamp,
    pub plan_end: Timestamp,
    #[serde(default)]
    pub plan_yield: Yield,
}

impl NewRobot {
    pub fn new(
        owner_user_id: UserId,
        ticker: impl Into<Ticker>,
        buy_price: Price,
        sell_price: Price,
        plan_start: Timestamp,
        plan_end: Timestamp,
    ) -> Self {
        Self {
            owner_user_id,
            parent_robot_id: None,
            is_favorite: false,
            ticker: ticker.into(),
            buy_price,
            sell_price,
            plan_start,
            plan_end,
            plan_yield: Decimal::ZERO,
        }
    }

    pub fn with_plan_yield(mut self, plan_yield: Yield) -> Self {
        self.plan_yield = plan_yield;
        self
    }

    /// Check creation invariants
    pub fn validate(&self) -> Result<(), RobotSpecError> {
        if self.ticker.trim().is_empty() {
            return Err(RobotSpecError::EmptyTicker);
        }
        if self.buy_price >= self.sell_price {
            return Err(RobotSpecError::InvertedPrices {
                buy: self.buy_price,
                sell: self.sell_price,
            });
        }
        if self.plan_start >= self.plan_end {
            return Err(RobotSpecError::InvertedWindow {
                start: self.plan_start,
                end: self.plan_end,
            });
        }
        Ok(())
    }
}

impl Robot {
    /// Materialize a draft once storage has assigned an id
    pub fn from_new(robot_id: RobotId, draft: NewRobot, created_at: Timestamp) -> Self {
        Self {
            robot_id,
            owner_user_id: draft.owner_user_id,
            parent_robot_id: draft.parent_robot_id,
            is_favorite: draft.is_favorite,
            is_active: false,
            ticker: draft.ticker,
            buy_price: draft.buy_price,
            sell_price: draft.sell_price,
            plan_start: draft.plan_start,
            plan_end: draft.plan_end,
            plan_yield: draft.plan_yield,
            fact_yield: Decimal::ZERO,
            deals_count: 0,
            activated_at: None,
            deactivated_at: None,
            created_at,
            deleted_at: None,
        }
    }

    /// Draft a favorite copy of this robot for another owner
    ///
    /// Configuration is kept, counters start from zero.
    pub fn favorite_for(&self, owner_user_id: UserId) -> NewRobot {
        NewRobot {
            owner_user_id,
            parent_robot_id: Some(self.robot_id),
            is_favorite: true,
            ticker: self.ticker.clone(),
            buy_price: self.buy_price,
            sell_price: self.sell_price,
            plan_start: self.plan_start,
            plan_end: self.plan_end,
            plan_yield: self.plan_yield,
        }
    }

    /// Whether `now` falls strictly inside the plan window
    pub fn is_window_open(&self, now: Timestamp) -> bool {
        self.plan_start < now && now < self.plan_end
    }

    /// Whether the plan window has already closed
    pub fn is_plan_over(&self, now: Timestamp) -> bool {
        now >= self.plan_end
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Active, not deleted, and inside the plan window
    pub fn is_eligible_to_run(&self, now: Timestamp) -> bool {
        self.is_active && !self.is_deleted() && self.is_window_open(now)
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_user_id == user_id
    }
}
