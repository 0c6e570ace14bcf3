//! Activation Scheduler - starts tasks for robots whose window opened
//!
//! Polls storage on a fixed interval. Admission goes through the run
//! registry only, so overlapping polls cannot start a robot twice.

use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::task::{ExecutionTask, TaskContext};

pub struct ActivationScheduler {
    ctx: TaskContext,
    tracker: TaskTracker,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ActivationScheduler {
    /// Tasks are spawned on `tracker` so the owner can wait for them.
    /// Once `shutdown` fires no further tasks are started.
    pub fn new(
        ctx: TaskContext,
        tracker: TaskTracker,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            ctx,
            tracker,
            interval,
            shutdown,
        }
    }

    /// Run one discovery pass; returns how many tasks were started
    ///
    /// A failed query is logged and yields 0, the next pass retries.
    pub async fn poll_once(&self) -> usize {
        if self.shutdown.is_cancelled() {
            return 0;
        }

        let now = self.ctx.clock.now();
        let eligible = match self.ctx.store.find_eligible_to_run(now).await {
            Ok(robots) => robots,
            Err(err) => {
                log::warn!("Eligibility query failed, retrying next tick: {}", err);
                return 0;
            }
        };

        let mut started = 0;
        for robot in eligible {
            let id = robot.robot_id;
            let Some(cancel) = self.ctx.registry.acquire(id) else {
                continue;
            };

            log::debug!("[robot {}] Admitted, spawning execution task", id);
            let task = ExecutionTask::new(robot, cancel, self.ctx.clone());
            self.tracker.spawn(task.run());
            started += 1;
        }

        if started > 0 {
            log::info!(
                "Started {} robot(s), {} running",
                started,
                self.ctx.registry.len()
            );
        }
        started
    }

    /// Poll until shutdown
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!("Activation scheduler started, polling every {:?}", self.interval);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }

        log::info!("Activation scheduler stopped");
    }
}
