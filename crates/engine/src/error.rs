use talos_core::{RobotId, RobotSpecError, UserId};
use talos_ports::StoreError;
use thiserror::Error;

/// Errors returned by engine commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Robot not found: {0}")]
    NotFound(RobotId),

    #[error("Activation not available now for robot {0}")]
    ActivationUnavailable(RobotId),

    #[error("Deactivation not available now for robot {0}")]
    DeactivationUnavailable(RobotId),

    #[error("Invalid robot: {0}")]
    InvalidRobot(#[from] RobotSpecError),

    #[error("User {user} is not allowed to modify robot {robot}")]
    Forbidden { robot: RobotId, user: UserId },

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::NotFound(id),
            StoreError::ActivationUnavailable(id) => EngineError::ActivationUnavailable(id),
            StoreError::DeactivationUnavailable(id) => EngineError::DeactivationUnavailable(id),
            StoreError::Backend(msg) => EngineError::Persistence(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
