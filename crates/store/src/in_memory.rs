use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use talos_core::{NewRobot, Robot, RobotId, Timestamp, Yield};
use talos_ports::{RobotFilter, RobotStore, StoreError, StoreResult};

/// In-memory robot repository
///
/// Thread-safe storage for robots using DashMap. Ids are assigned
/// sequentially starting at 1. State transitions (activate, deactivate,
/// delete) run under the entry's shard lock, so two concurrent callers
/// cannot both win the same transition.
pub struct InMemoryRobotStore {
    /// Robots by ID
    robots: Arc<DashMap<RobotId, Robot>>,
    /// Last assigned ID
    last_id: Arc<AtomicI64>,
}

impl InMemoryRobotStore {
    pub fn new() -> Self {
        Self {
            robots: Arc::new(DashMap::new()),
            last_id: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Number of stored robots, deleted ones included
    pub fn len(&self) -> usize {
        self.robots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }
}

impl Default for InMemoryRobotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryRobotStore {
    fn clone(&self) -> Self {
        Self {
            robots: Arc::clone(&self.robots),
            last_id: Arc::clone(&self.last_id),
        }
    }
}

#[async_trait]
impl RobotStore for InMemoryRobotStore {
    async fn create(&self, draft: NewRobot, created_at: Timestamp) -> StoreResult<Robot> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let robot = Robot::from_new(id, draft, created_at);
        self.robots.insert(id, robot.clone());
        log::debug!("Stored robot {} for owner {}", id, robot.owner_user_id);
        Ok(robot)
    }

    async fn find_by_id(&self, id: RobotId) -> StoreResult<Robot> {
        self.robots
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn find_all(&self, filter: &RobotFilter) -> StoreResult<Vec<Robot>> {
        let mut robots: Vec<Robot> = self
            .robots
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        robots.sort_by_key(|r| r.robot_id);
        Ok(robots)
    }

    async fn find_eligible_to_run(&self, now: Timestamp) -> StoreResult<Vec<Robot>> {
        let mut robots: Vec<Robot> = self
            .robots
            .iter()
            .filter(|r| r.value().is_eligible_to_run(now))
            .map(|r| r.value().clone())
            .collect();
        robots.sort_by_key(|r| r.robot_id);
        Ok(robots)
    }

    async fn record_leg(
        &self,
        id: RobotId,
        fact_yield: Yield,
        deals_count: u64,
    ) -> StoreResult<Robot> {
        let mut robot = self.robots.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        robot.fact_yield = fact_yield;
        robot.deals_count = deals_count;
        Ok(robot.clone())
    }

    async fn activate_by_id(&self, id: RobotId, at: Timestamp) -> StoreResult<()> {
        let mut robot = self.robots.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if robot.is_active || robot.is_deleted() {
            return Err(StoreError::ActivationUnavailable(id));
        }
        robot.is_active = true;
        robot.activated_at = Some(at);
        Ok(())
    }

    async fn deactivate_by_id(&self, id: RobotId, at: Timestamp) -> StoreResult<()> {
        let mut robot = self.robots.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if !robot.is_active {
            return Err(StoreError::DeactivationUnavailable(id));
        }
        robot.is_active = false;
        robot.deactivated_at = Some(at);
        Ok(())
    }

    async fn delete_by_id(&self, id: RobotId, at: Timestamp) -> StoreResult<()> {
        let mut robot = self.robots.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if robot.deleted_at.is_none() {
            robot.deleted_at = Some(at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn draft(owner: i64, ticker: &str) -> NewRobot {
        let now = Utc::now();
        NewRobot::new(
            owner,
            ticker,
            dec!(100),
            dec!(110),
            now - Duration::minutes(10),
            now + Duration::hours(1),
        )
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryRobotStore::new();

        let a = store.create(draft(1, "AAPL"), Utc::now()).await.unwrap();
        let b = store.create(draft(1, "MSFT"), Utc::now()).await.unwrap();

        assert_eq!(a.robot_id, 1);
        assert_eq!(b.robot_id, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_id_missing() {
        let store = InMemoryRobotStore::new();
        assert_eq!(store.find_by_id(5).await, Err(StoreError::NotFound(5)));
    }

    #[tokio::test]
    async fn test_activate_twice_is_unavailable() {
        let store = InMemoryRobotStore::new();
        let robot = store.create(draft(1, "AAPL"), Utc::now()).await.unwrap();
        let first = Utc::now();

        store.activate_by_id(robot.robot_id, first).await.unwrap();
        let err = store
            .activate_by_id(robot.robot_id, first + Duration::seconds(5))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::ActivationUnavailable(robot.robot_id));

        let stored = store.find_by_id(robot.robot_id).await.unwrap();
        assert_eq!(stored.activated_at, Some(first));
    }

    #[tokio::test]
    async fn test_deactivate_inactive_is_unavailable() {
        let store = InMemoryRobotStore::new();
        let robot = store.create(draft(1, "AAPL"), Utc::now()).await.unwrap();

        let err = store
            .deactivate_by_id(robot.robot_id, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::DeactivationUnavailable(robot.robot_id));
    }

    #[tokio::test]
    async fn test_eligible_excludes_inactive_deleted_and_closed_windows() {
        let store = InMemoryRobotStore::new();
        let now = Utc::now();

        let running = store.create(draft(1, "AAPL"), now).await.unwrap();
        store.activate_by_id(running.robot_id, now).await.unwrap();

        let _inactive = store.create(draft(1, "AAPL"), now).await.unwrap();

        let deleted = store.create(draft(1, "AAPL"), now).await.unwrap();
        store.activate_by_id(deleted.robot_id, now).await.unwrap();
        store.delete_by_id(deleted.robot_id, now).await.unwrap();

        let mut future = draft(1, "AAPL");
        future.plan_start = now + Duration::hours(1);
        future.plan_end = now + Duration::hours(2);
        let future = store.create(future, now).await.unwrap();
        store.activate_by_id(future.robot_id, now).await.unwrap();

        let eligible = store.find_eligible_to_run(now).await.unwrap();
        let ids: Vec<_> = eligible.iter().map(|r| r.robot_id).collect();
        assert_eq!(ids, vec![running.robot_id]);
    }

    #[tokio::test]
    async fn test_find_all_filters_and_hides_deleted() {
        let store = InMemoryRobotStore::new();
        let now = Utc::now();

        store.create(draft(1, "AAPL"), now).await.unwrap();
        store.create(draft(1, "MSFT"), now).await.unwrap();
        store.create(draft(2, "AAPL"), now).await.unwrap();
        let gone = store.create(draft(2, "AAPL"), now).await.unwrap();
        store.delete_by_id(gone.robot_id, now).await.unwrap();

        assert_eq!(store.find_all(&RobotFilter::all()).await.unwrap().len(), 3);
        assert_eq!(
            store
                .find_all(&RobotFilter::all().owner(1))
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            store
                .find_all(&RobotFilter::all().ticker("AAPL"))
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            store
                .find_all(&RobotFilter::all().owner(2).ticker("AAPL"))
                .await
                .unwrap()
                .len(),
            1
        );

        // Deleted robots stay addressable by id
        let stored = store.find_by_id(gone.robot_id).await.unwrap();
        assert!(stored.is_deleted());
    }

    #[tokio::test]
    async fn test_record_leg_writes_counters() {
        let store = InMemoryRobotStore::new();
        let robot = store.create(draft(1, "AAPL"), Utc::now()).await.unwrap();

        let returned = store.record_leg(robot.robot_id, dec!(-99), 1).await.unwrap();

        let stored = store.find_by_id(robot.robot_id).await.unwrap();
        assert_eq!(stored, returned);
        assert_eq!(stored.fact_yield, dec!(-99));
        assert_eq!(stored.deals_count, 1);
    }

    #[tokio::test]
    async fn test_record_leg_keeps_deactivation() {
        let store = InMemoryRobotStore::new();
        let now = Utc::now();
        let robot = store.create(draft(1, "AAPL"), now).await.unwrap();
        store.activate_by_id(robot.robot_id, now).await.unwrap();

        // Snapshot taken by a task before the owner deactivates
        let snapshot = store.find_by_id(robot.robot_id).await.unwrap();
        store.deactivate_by_id(robot.robot_id, now).await.unwrap();

        let stored = store
            .record_leg(robot.robot_id, dec!(-50), snapshot.deals_count + 1)
            .await
            .unwrap();

        assert!(!stored.is_active);
        assert_eq!(stored.deactivated_at, Some(now));
        assert_eq!(stored.deals_count, 1);
        assert!(store.find_eligible_to_run(now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_leg_unknown_robot() {
        let store = InMemoryRobotStore::new();
        assert_eq!(
            store.record_leg(77, dec!(1), 1).await,
            Err(StoreError::NotFound(77))
        );
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = InMemoryRobotStore::new();
        let other = store.clone();

        let robot = store.create(draft(1, "AAPL"), Utc::now()).await.unwrap();
        assert!(other.find_by_id(robot.robot_id).await.is_ok());
    }
}
