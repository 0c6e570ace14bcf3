//! Talos Runner
//!
//! Runs the robot engine as a single-process service:
//!
//! - **Config**: engine, simulator, and seed robots from one JSON file
//! - **Service**: in-memory store, channel price feed, quote simulator,
//!   and a change logger wired around the engine
//!
//! ## Architecture
//!
//! ```text
//!   ┌────────────────┐ quotes ┌──────────────────┐ subscribe ┌───────────────┐
//!   │ QuoteSimulator │ ─────► │ ChannelPriceFeed │ ◄──────── │  RobotEngine  │
//!   └────────────────┘        └──────────────────┘           └───────┬───────┘
//!                                                                    │ changes
//!                                                                    ▼
//!                                                            ┌───────────────┐
//!                                                            │ change logger │
//!                                                            └───────────────┘
//! ```

pub mod config;
pub mod service;

pub use config::{RunnerConfig, SeedRobot};
pub use service::RobotService;
