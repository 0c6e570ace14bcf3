//! Change Broadcaster - fan-out of robot state changes
//!
//! Every observer gets its own bounded ring. A slow observer never
//! blocks publishers or other observers: once its ring is full the
//! oldest undelivered records are overwritten.

use talos_core::Robot;
use tokio::sync::broadcast;

/// Largest per-observer ring; the channel allocates it up front
pub const MAX_OBSERVER_CAPACITY: usize = 1 << 16;

/// Publishing half; cheap to clone
#[derive(Debug, Clone)]
pub struct ChangeBroadcaster {
    tx: broadcast::Sender<Robot>,
}

impl ChangeBroadcaster {
    /// Create a broadcaster whose observers buffer up to `capacity` records
    ///
    /// `capacity` is clamped to `1..=MAX_OBSERVER_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.clamp(1, MAX_OBSERVER_CAPACITY));
        Self { tx }
    }

    /// Publish a record to all observers; never blocks
    ///
    /// Returns the number of observers it was queued for.
    pub fn publish(&self, robot: Robot) -> usize {
        let id = robot.robot_id;
        match self.tx.send(robot) {
            Ok(observers) => observers,
            Err(_) => {
                log::trace!("[robot {}] No observers, change dropped", id);
                0
            }
        }
    }

    pub fn subscribe(&self) -> RobotObserver {
        RobotObserver {
            rx: self.tx.subscribe(),
            dropped: 0,
        }
    }
}

/// Receiving half held by one observer
#[derive(Debug)]
pub struct RobotObserver {
    rx: broadcast::Receiver<Robot>,
    dropped: u64,
}

impl RobotObserver {
    /// Wait for the next change; `None` once the engine is gone
    pub async fn next(&mut self) -> Option<Robot> {
        loop {
            match self.rx.recv().await {
                Ok(robot) => return Some(robot),
                Err(broadcast::error::RecvError::Lagged(n)) => self.record_lag(n),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take a change if one is already queued
    pub fn try_next(&mut self) -> Option<Robot> {
        loop {
            match self.rx.try_recv() {
                Ok(robot) => return Some(robot),
                Err(broadcast::error::TryRecvError::Lagged(n)) => self.record_lag(n),
                Err(_) => return None,
            }
        }
    }

    /// Records this observer lost to overflow so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn record_lag(&mut self, n: u64) {
        self.dropped += n;
        log::warn!("Observer lagged, dropped {} robot changes", n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use talos_core::NewRobot;

    fn robot(id: i64) -> Robot {
        let now = Utc::now();
        let draft = NewRobot::new(1, "SBER", dec!(1), dec!(2), now, now + Duration::hours(1));
        Robot::from_new(id, draft, now)
    }

    #[tokio::test]
    async fn test_every_observer_gets_every_change() {
        let broadcaster = ChangeBroadcaster::new(16);
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();

        assert_eq!(broadcaster.publish(robot(1)), 2);

        assert_eq!(a.next().await.unwrap().robot_id, 1);
        assert_eq!(b.next().await.unwrap().robot_id, 1);
    }

    #[test]
    fn test_publish_without_observers() {
        let broadcaster = ChangeBroadcaster::new(16);
        assert_eq!(broadcaster.publish(robot(1)), 0);

        let observer = broadcaster.subscribe();
        drop(observer);
        assert_eq!(broadcaster.publish(robot(2)), 0);
    }

    #[test]
    fn test_slow_observer_drops_oldest() {
        let broadcaster = ChangeBroadcaster::new(2);
        let mut slow = broadcaster.subscribe();

        for id in 1..=5 {
            broadcaster.publish(robot(id));
        }

        assert_eq!(slow.try_next().unwrap().robot_id, 4);
        assert_eq!(slow.dropped(), 3);
        assert_eq!(slow.try_next().unwrap().robot_id, 5);
        assert!(slow.try_next().is_none());
    }

    #[test]
    fn test_oversized_capacity_is_clamped() {
        let broadcaster = ChangeBroadcaster::new(usize::MAX);
        let mut observer = broadcaster.subscribe();

        assert_eq!(broadcaster.publish(robot(1)), 1);
        assert_eq!(observer.try_next().unwrap().robot_id, 1);
    }

    #[tokio::test]
    async fn test_observer_ends_when_broadcaster_dropped() {
        let broadcaster = ChangeBroadcaster::new(4);
        let mut observer = broadcaster.subscribe();
        drop(broadcaster);

        assert!(observer.next().await.is_none());
    }
}
