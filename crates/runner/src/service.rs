//! Robot Service - single-process wiring around the engine

use std::future::Future;
use std::sync::Arc;
use talos_clock::SystemClock;
use talos_core::Robot;
use talos_engine::{EngineError, RobotEngine, RobotObserver};
use talos_feed::{ChannelPriceFeed, QuoteSimulator};
use talos_ports::Clock;
use talos_store::InMemoryRobotStore;
use tokio::task::JoinHandle;

use crate::config::RunnerConfig;

pub struct RobotService {
    config: RunnerConfig,
    engine: Arc<RobotEngine>,
    feed: Arc<ChannelPriceFeed>,
    clock: Arc<dyn Clock>,
}

impl RobotService {
    /// Service on wall-clock time
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: RunnerConfig, clock: Arc<dyn Clock>) -> Self {
        let feed = Arc::new(ChannelPriceFeed::new());
        let engine = Arc::new(RobotEngine::new(
            config.engine.clone(),
            Arc::new(InMemoryRobotStore::new()),
            feed.clone(),
            clock.clone(),
        ));

        Self {
            config,
            engine,
            feed,
            clock,
        }
    }

    pub fn engine(&self) -> &Arc<RobotEngine> {
        &self.engine
    }

    pub fn feed(&self) -> &Arc<ChannelPriceFeed> {
        &self.feed
    }

    /// Create the configured robots and activate those marked for it
    ///
    /// A robot that cannot be activated is logged and left inactive.
    pub async fn seed_robots(&self) -> Result<Vec<Robot>, EngineError> {
        let commands = self.engine.commands();
        let mut seeded = Vec::with_capacity(self.config.robots.len());

        for seed in &self.config.robots {
            let draft = match seed.draft(self.clock.now()) {
                Ok(draft) => draft,
                Err(err) => {
                    log::error!("Skipping seed robot for owner {}: {}", seed.owner_user_id, err);
                    continue;
                }
            };
            let mut robot = commands.create_robot(seed.owner_user_id, draft).await?;

            if seed.activate {
                match commands.activate(robot.robot_id, seed.owner_user_id).await {
                    Ok(active) => robot = active,
                    Err(err) => log::warn!("[robot {}] Left inactive: {}", robot.robot_id, err),
                }
            }
            seeded.push(robot);
        }

        log::info!("Seeded {} robot(s)", seeded.len());
        Ok(seeded)
    }

    /// Start publishing simulated quotes into the feed
    pub fn spawn_simulator(&self) -> JoinHandle<()> {
        let simulator = QuoteSimulator::new(self.config.simulator.clone(), self.feed.clone());
        tokio::spawn(simulator.run())
    }

    /// Log every robot change as a JSON line
    pub fn spawn_change_logger(&self) -> JoinHandle<()> {
        let observer = self.engine.subscribe();
        tokio::spawn(log_changes(observer))
    }

    /// Seed, start, and serve until `signal` resolves, then shut down
    ///
    /// Returns true when every robot stopped within the grace period.
    pub async fn run_until<F>(self, signal: F) -> Result<bool, EngineError>
    where
        F: Future<Output = ()>,
    {
        self.seed_robots().await?;

        let logger = self.spawn_change_logger();
        let simulator = self.spawn_simulator();
        self.engine.start();
        log::info!(
            "Service running: {} ticker(s), polling every {}ms",
            self.config.simulator.tickers.len(),
            self.config.engine.poll_interval_ms
        );

        signal.await;
        log::info!("Stop requested");

        let clean = self
            .engine
            .shutdown(self.config.shutdown_mode, self.config.shutdown_grace())
            .await;

        simulator.abort();
        logger.abort();

        Ok(clean)
    }
}

async fn log_changes(mut observer: RobotObserver) {
    while let Some(robot) = observer.next().await {
        match serde_json::to_string(&robot) {
            Ok(json) => log::info!("robot change {}", json),
            Err(err) => log::error!("[robot {}] Failed to encode change: {}", robot.robot_id, err),
        }
    }
}
