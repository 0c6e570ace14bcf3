//! Talos Core Domain
//!
//! Pure domain types for the Talos robot execution engine.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{NewRobot, Quote, Robot, RobotSpecError, TradeLeg, TradePhase};
pub use values::{Price, RobotId, Ticker, Timestamp, UserId, Yield};
