use async_trait::async_trait;
use talos_core::{NewRobot, Robot, RobotId, Timestamp, UserId, Yield};

use crate::error::StoreResult;

/// Listing filter; `None` fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotFilter {
    pub owner_user_id: Option<UserId>,
    pub ticker: Option<String>,
}

impl RobotFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn owner(mut self, owner_user_id: UserId) -> Self {
        self.owner_user_id = Some(owner_user_id);
        self
    }

    pub fn ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    /// Whether a robot passes the filter (deleted robots never do)
    pub fn matches(&self, robot: &Robot) -> bool {
        !robot.is_deleted()
            && self.owner_user_id.is_none_or(|owner| robot.owner_user_id == owner)
            && self.ticker.as_deref().is_none_or(|ticker| robot.ticker == ticker)
    }
}

/// Port for robot persistence
///
/// Implementations must be safe for concurrent use by different robots.
/// The engine never serializes storage calls across robots.
#[async_trait]
pub trait RobotStore: Send + Sync {
    /// Persist a new robot; storage assigns the id
    async fn create(&self, draft: NewRobot, created_at: Timestamp) -> StoreResult<Robot>;

    /// Fetch a robot by id, including soft-deleted ones
    async fn find_by_id(&self, id: RobotId) -> StoreResult<Robot>;

    /// List non-deleted robots matching the filter
    async fn find_all(&self, filter: &RobotFilter) -> StoreResult<Vec<Robot>>;

    /// Robots that are active, not deleted, and inside their plan window at `now`
    async fn find_eligible_to_run(&self, now: Timestamp) -> StoreResult<Vec<Robot>>;

    /// Store the trade counters after a completed leg
    ///
    /// Only `fact_yield` and `deals_count` are written. Lifecycle fields
    /// belong to activate, deactivate and delete, so a concurrent
    /// deactivation survives the write. Returns the stored record.
    async fn record_leg(
        &self,
        id: RobotId,
        fact_yield: Yield,
        deals_count: u64,
    ) -> StoreResult<Robot>;

    /// Flip an inactive robot to active
    ///
    /// Fails with `ActivationUnavailable` when it is already active.
    async fn activate_by_id(&self, id: RobotId, at: Timestamp) -> StoreResult<()>;

    /// Flip an active robot to inactive
    ///
    /// Fails with `DeactivationUnavailable` when it is not active.
    async fn deactivate_by_id(&self, id: RobotId, at: Timestamp) -> StoreResult<()>;

    /// Soft delete: stamp `deleted_at`
    async fn delete_by_id(&self, id: RobotId, at: Timestamp) -> StoreResult<()>;
}
