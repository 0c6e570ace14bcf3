//! Robot Commands - user-facing operations on robots
//!
//! Every command validates synchronously and returns its error to the
//! caller; nothing is retried. State changes are published to the
//! change broadcaster after they are persisted.

use std::sync::Arc;
use talos_core::{NewRobot, Robot, RobotId, UserId};
use talos_ports::{Clock, RobotFilter, RobotStore};

use crate::broadcaster::ChangeBroadcaster;
use crate::config::WindowGuard;
use crate::error::{EngineError, Result};
use crate::registry::RunRegistry;

#[derive(Clone)]
pub struct RobotCommands {
    store: Arc<dyn RobotStore>,
    clock: Arc<dyn Clock>,
    registry: Arc<RunRegistry>,
    broadcaster: ChangeBroadcaster,
    window_guard: WindowGuard,
}

impl RobotCommands {
    pub fn new(
        store: Arc<dyn RobotStore>,
        clock: Arc<dyn Clock>,
        registry: Arc<RunRegistry>,
        broadcaster: ChangeBroadcaster,
        window_guard: WindowGuard,
    ) -> Self {
        Self {
            store,
            clock,
            registry,
            broadcaster,
            window_guard,
        }
    }

    /// Validate and persist a new, inactive robot owned by `owner`
    pub async fn create_robot(&self, owner: UserId, mut draft: NewRobot) -> Result<Robot> {
        draft.owner_user_id = owner;
        draft.validate()?;

        let robot = self.store.create(draft, self.clock.now()).await?;
        log::info!(
            "[robot {}] Created by user {} on {}",
            robot.robot_id,
            owner,
            robot.ticker
        );
        Ok(robot)
    }

    /// Switch a robot on so the scheduler picks it up once its window opens
    pub async fn activate(&self, id: RobotId, requester: UserId) -> Result<Robot> {
        let robot = self.store.find_by_id(id).await?;
        let now = self.clock.now();

        if robot.is_active
            || robot.is_deleted()
            || !robot.is_owned_by(requester)
            || !self.window_guard.allows(&robot, now)
        {
            log::debug!("[robot {}] Activation refused for user {}", id, requester);
            return Err(EngineError::ActivationUnavailable(id));
        }

        self.store.activate_by_id(id, now).await?;
        let robot = self.store.find_by_id(id).await?;

        log::info!("[robot {}] Activated by user {}", id, requester);
        self.broadcaster.publish(robot.clone());
        Ok(robot)
    }

    /// Switch a robot off and stop its task if one is running
    pub async fn deactivate(&self, id: RobotId, requester: UserId) -> Result<Robot> {
        let robot = self.store.find_by_id(id).await?;
        let now = self.clock.now();

        if !robot.is_active
            || !robot.is_owned_by(requester)
            || !self.window_guard.allows(&robot, now)
        {
            log::debug!("[robot {}] Deactivation refused for user {}", id, requester);
            return Err(EngineError::DeactivationUnavailable(id));
        }

        self.store.deactivate_by_id(id, now).await?;
        if self.registry.cancel(id) {
            log::info!("[robot {}] Stopping running task", id);
        }
        let robot = self.store.find_by_id(id).await?;

        log::info!("[robot {}] Deactivated by user {}", id, requester);
        self.broadcaster.publish(robot.clone());
        Ok(robot)
    }

    /// Copy someone's robot into `requester`'s favorites
    ///
    /// The copy keeps the configuration, starts with zero counters and
    /// is inactive.
    pub async fn add_to_favorite(&self, id: RobotId, requester: UserId) -> Result<Robot> {
        let parent = self.store.find_by_id(id).await?;
        if parent.is_deleted() {
            return Err(EngineError::NotFound(id));
        }

        let favorite = self
            .store
            .create(parent.favorite_for(requester), self.clock.now())
            .await?;

        log::info!(
            "[robot {}] Favorite of robot {} added for user {}",
            favorite.robot_id,
            id,
            requester
        );
        self.broadcaster.publish(favorite.clone());
        Ok(favorite)
    }

    /// Soft delete; only the owner may delete, and only once
    pub async fn delete(&self, id: RobotId, requester: UserId) -> Result<()> {
        let robot = self.store.find_by_id(id).await?;
        if !robot.is_owned_by(requester) || robot.is_deleted() {
            return Err(EngineError::Forbidden {
                robot: id,
                user: requester,
            });
        }

        self.store.delete_by_id(id, self.clock.now()).await?;
        if self.registry.cancel(id) {
            log::info!("[robot {}] Stopping running task", id);
        }

        log::info!("[robot {}] Deleted by user {}", id, requester);
        Ok(())
    }

    pub async fn details(&self, id: RobotId) -> Result<Robot> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Non-deleted robots matching the filter, ordered by id
    pub async fn list(&self, filter: &RobotFilter) -> Result<Vec<Robot>> {
        Ok(self.store.find_all(filter).await?)
    }
}
