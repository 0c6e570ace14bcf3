//! Robot Engine - wires the scheduler, registry, broadcaster and commands

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use talos_core::RobotId;
use talos_ports::{Clock, PriceFeed, RobotStore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::broadcaster::{ChangeBroadcaster, RobotObserver};
use crate::commands::RobotCommands;
use crate::config::EngineConfig;
use crate::registry::RunRegistry;
use crate::scheduler::ActivationScheduler;
use crate::task::TaskContext;

/// How in-flight robots are treated on shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownMode {
    /// Let running robots trade until their plan window ends
    Drain,
    /// Stop running robots right away
    #[default]
    Cancel,
}

pub struct RobotEngine {
    registry: Arc<RunRegistry>,
    broadcaster: ChangeBroadcaster,
    commands: RobotCommands,
    scheduler: Arc<ActivationScheduler>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    started: AtomicBool,
}

impl RobotEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn RobotStore>,
        feed: Arc<dyn PriceFeed>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = Arc::new(RunRegistry::new());
        let broadcaster = ChangeBroadcaster::new(config.observer_capacity);
        let tracker = TaskTracker::new();
        let shutdown = CancellationToken::new();

        let commands = RobotCommands::new(
            store.clone(),
            clock.clone(),
            registry.clone(),
            broadcaster.clone(),
            config.window_guard,
        );

        let ctx = TaskContext {
            store,
            feed,
            clock,
            registry: registry.clone(),
            broadcaster: broadcaster.clone(),
            policy: config.feed.clone(),
        };
        let scheduler = Arc::new(ActivationScheduler::new(
            ctx,
            tracker.clone(),
            config.poll_interval(),
            shutdown.clone(),
        ));

        Self {
            registry,
            broadcaster,
            commands,
            scheduler,
            tracker,
            shutdown,
            started: AtomicBool::new(false),
        }
    }

    /// Spawn the activation scheduler; false if it was already started
    pub fn start(&self) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            return false;
        }

        let scheduler = self.scheduler.clone();
        tokio::spawn(async move { scheduler.run().await });
        true
    }

    pub fn commands(&self) -> &RobotCommands {
        &self.commands
    }

    /// Attach a new observer of robot changes
    pub fn subscribe(&self) -> RobotObserver {
        self.broadcaster.subscribe()
    }

    /// Run one discovery pass outside the scheduler's timer
    pub async fn poll_once(&self) -> usize {
        self.scheduler.poll_once().await
    }

    pub fn is_running(&self, id: RobotId) -> bool {
        self.registry.is_running(id)
    }

    pub fn running(&self) -> Vec<RobotId> {
        self.registry.running()
    }

    /// Stop discovery, then wait up to `grace` for execution tasks
    ///
    /// In `Drain` mode tasks keep trading until their window ends. Tasks
    /// still running once `grace` expires are cancelled. Returns true if
    /// every task stopped within the grace period.
    pub async fn shutdown(&self, mode: ShutdownMode, grace: Duration) -> bool {
        log::info!(
            "Shutting down ({:?}), {} robot(s) running",
            mode,
            self.registry.len()
        );
        self.shutdown.cancel();
        if mode == ShutdownMode::Cancel {
            self.registry.close();
        }
        self.tracker.close();

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                log::info!("All execution tasks stopped");
                true
            }
            Err(_) => {
                log::warn!(
                    "Grace period of {:?} expired, cancelling {} robot(s)",
                    grace,
                    self.registry.len()
                );
                self.registry.close();
                false
            }
        }
    }
}
