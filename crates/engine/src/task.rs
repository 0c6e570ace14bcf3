//! Execution Task - drives one robot through its buy/sell cycle
//!
//! A task owns one price subscription for the robot's ticker and runs
//! until the plan window ends, its token is cancelled, or the feed stays
//! broken after every reconnect attempt. Whatever the reason, the task
//! releases its registry entry on the way out.

use std::sync::Arc;
use talos_core::{Quote, Robot, TradeLeg, TradePhase};
use talos_ports::{Clock, FeedError, PriceFeed, QuoteStream, RobotStore};
use tokio_util::sync::CancellationToken;

use crate::backoff::ReconnectBackoff;
use crate::broadcaster::ChangeBroadcaster;
use crate::config::FeedPolicy;
use crate::registry::RunRegistry;

/// Collaborators shared by every task
#[derive(Clone)]
pub struct TaskContext {
    pub store: Arc<dyn RobotStore>,
    pub feed: Arc<dyn PriceFeed>,
    pub clock: Arc<dyn Clock>,
    pub registry: Arc<RunRegistry>,
    pub broadcaster: ChangeBroadcaster,
    pub policy: FeedPolicy,
}

/// Why a task stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskExit {
    PlanEnded,
    Cancelled,
    /// Feed still failing once reconnect attempts ran out
    FeedFailed(FeedError),
}

enum Interrupt {
    Exit(TaskExit),
    Feed(FeedError),
}

pub struct ExecutionTask {
    robot: Robot,
    phase: TradePhase,
    cancel: CancellationToken,
    ctx: TaskContext,
}

impl ExecutionTask {
    /// `cancel` is the token handed out by [`RunRegistry::acquire`]
    pub fn new(robot: Robot, cancel: CancellationToken, ctx: TaskContext) -> Self {
        Self {
            robot,
            phase: TradePhase::Sold,
            cancel,
            ctx,
        }
    }

    /// Run to completion
    pub async fn run(mut self) -> TaskExit {
        let id = self.robot.robot_id;
        log::info!(
            "[robot {}] Started on {} (buy <= {}, sell >= {}, until {})",
            id,
            self.robot.ticker,
            self.robot.buy_price,
            self.robot.sell_price,
            self.robot.plan_end
        );

        let exit = self.drive().await;

        self.ctx.registry.release(id);
        match &exit {
            TaskExit::FeedFailed(err) => log::error!("[robot {}] Stopped, feed failed: {}", id, err),
            other => log::info!(
                "[robot {}] Stopped: {:?} (fact_yield={}, deals={})",
                id,
                other,
                self.robot.fact_yield,
                self.robot.deals_count
            ),
        }
        exit
    }

    async fn drive(&mut self) -> TaskExit {
        let id = self.robot.robot_id;
        let mut backoff = self.ctx.policy.backoff();

        loop {
            let interrupt = match self.open().await {
                Ok(stream) => self.consume(stream, &mut backoff).await,
                Err(interrupt) => interrupt,
            };

            let err = match interrupt {
                Interrupt::Exit(exit) => return exit,
                Interrupt::Feed(err) => err,
            };

            let Some(delay) = backoff.next_delay() else {
                return TaskExit::FeedFailed(err);
            };
            log::warn!(
                "[robot {}] Feed interrupted ({}), reconnect {}/{} in {:?}",
                id,
                err,
                backoff.attempt(),
                backoff.max_attempts(),
                delay
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return TaskExit::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }

            if self.robot.is_plan_over(self.ctx.clock.now()) {
                return TaskExit::PlanEnded;
            }
        }
    }

    async fn open(&self) -> Result<Box<dyn QuoteStream>, Interrupt> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupt::Exit(TaskExit::Cancelled)),
            subscribed = self.ctx.feed.subscribe(&self.robot.ticker) => {
                subscribed.map_err(Interrupt::Feed)
            }
        }
    }

    /// Consume quotes until something interrupts the subscription
    async fn consume(
        &mut self,
        mut stream: Box<dyn QuoteStream>,
        backoff: &mut ReconnectBackoff,
    ) -> Interrupt {
        let idle = self.ctx.policy.idle_timeout();

        loop {
            let now = self.ctx.clock.now();
            if self.robot.is_plan_over(now) {
                return Interrupt::Exit(TaskExit::PlanEnded);
            }

            // Never sleep past the end of the plan window
            let wait = idle.min(self.ctx.clock.until(self.robot.plan_end));

            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Interrupt::Exit(TaskExit::Cancelled),
                received = tokio::time::timeout(wait, stream.next_quote()) => received,
            };

            match received {
                Err(_) if wait < idle => continue,
                Err(_) => return Interrupt::Feed(FeedError::IdleTimeout(idle)),
                Ok(Err(err)) => return Interrupt::Feed(err),
                Ok(Ok(None)) => return Interrupt::Feed(FeedError::Closed),
                Ok(Ok(Some(quote))) => {
                    backoff.reset();
                    if self.cancel.is_cancelled() {
                        return Interrupt::Exit(TaskExit::Cancelled);
                    }
                    if self.robot.is_plan_over(self.ctx.clock.now()) {
                        return Interrupt::Exit(TaskExit::PlanEnded);
                    }
                    self.on_quote(quote).await;
                }
            }
        }
    }

    async fn on_quote(&mut self, quote: Quote) {
        let id = self.robot.robot_id;
        let Some(leg) = self.phase.evaluate(&self.robot, &quote) else {
            log::trace!(
                "[robot {}] {:?}, quote {}/{} ignored",
                id,
                self.phase,
                quote.buy_price,
                quote.sell_price
            );
            return;
        };

        let mut robot = match self.ctx.store.find_by_id(id).await {
            Ok(fresh) => fresh,
            Err(err) => {
                log::warn!("[robot {}] Re-read failed, using working copy: {}", id, err);
                self.robot.clone()
            }
        };

        leg.apply(&mut robot);
        match self
            .ctx
            .store
            .record_leg(id, robot.fact_yield, robot.deals_count)
            .await
        {
            Ok(stored) => robot = stored,
            Err(err) => {
                log::error!("[robot {}] Failed to persist {}: {}", id, describe(&leg), err)
            }
        }

        self.phase = leg.next_phase();
        self.ctx.registry.set_phase(id, self.phase);

        log::info!(
            "[robot {}] {} (fact_yield={}, deals={})",
            id,
            describe(&leg),
            robot.fact_yield,
            robot.deals_count
        );

        self.robot = robot;
        self.ctx.broadcaster.publish(self.robot.clone());
    }
}

fn describe(leg: &TradeLeg) -> String {
    if leg.is_buy() {
        format!("BUY @ {}", leg.price())
    } else {
        format!("SELL @ {}", leg.price())
    }
}
