use std::time::Duration;
use talos_core::Timestamp;

/// Source of wall-clock time for plan windows
///
/// Every eligibility decision and window check reads time through this
/// port, so tests can hold time still and step it past window edges.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Time left until `deadline`; zero once it has passed
    fn until(&self, deadline: Timestamp) -> Duration {
        (deadline - self.now()).to_std().unwrap_or(Duration::ZERO)
    }
}
