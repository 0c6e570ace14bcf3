//! Talos Engine
//!
//! Runs trading robots against a live price feed.
//!
//! - **Activation Scheduler**: polls storage for robots whose plan window is open
//! - **Run Registry**: guarantees at most one execution task per robot
//! - **Execution Task**: consumes quotes and drives the buy/sell cycle
//! - **Change Broadcaster**: fans out every persisted change to observers
//! - **Commands**: create, activate, deactivate, favorite, delete, query
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────┐  eligible robots   ┌──────────────────┐
//!   │ ActivationScheduler   │ ◄──────────────── │    RobotStore     │
//!   └──────────┬────────────┘                    └────────▲─────────┘
//!              │ acquire(id)                              │ re-read / record_leg
//!              ▼                                          │
//!   ┌───────────────────────┐  spawn   ┌──────────────────┴──┐  quotes  ┌───────────┐
//!   │     RunRegistry       │ ───────► │   ExecutionTask     │ ◄─────── │ PriceFeed │
//!   └───────────────────────┘          └──────────┬──────────┘          └───────────┘
//!                                                 │ publish
//!                                                 ▼
//!                                      ┌─────────────────────┐
//!                                      │  ChangeBroadcaster  │ ──► observers
//!                                      └─────────────────────┘
//! ```

pub mod backoff;
pub mod broadcaster;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod task;

pub use backoff::ReconnectBackoff;
pub use broadcaster::{ChangeBroadcaster, MAX_OBSERVER_CAPACITY, RobotObserver};
pub use commands::RobotCommands;
pub use config::{ConfigError, EngineConfig, FeedPolicy, WindowGuard};
pub use engine::{RobotEngine, ShutdownMode};
pub use error::{EngineError, Result};
pub use registry::RunRegistry;
pub use scheduler::ActivationScheduler;
pub use task::{ExecutionTask, TaskContext, TaskExit};
