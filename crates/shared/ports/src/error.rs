use std::time::Duration;

use talos_core::RobotId;
use thiserror::Error;

/// Errors surfaced by a robot storage adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Robot not found: {0}")]
    NotFound(RobotId),

    #[error("Activation not available now for robot {0}")]
    ActivationUnavailable(RobotId),

    #[error("Deactivation not available now for robot {0}")]
    DeactivationUnavailable(RobotId),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by a price feed subscription
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Subscription failed: {0}")]
    Subscribe(String),

    #[error("Feed disconnected: {0}")]
    Disconnected(String),

    #[error("Feed closed")]
    Closed,

    #[error("No quote received for {0:?}")]
    IdleTimeout(Duration),
}

pub type FeedResult<T> = std::result::Result<T, FeedError>;
