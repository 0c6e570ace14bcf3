//! Talos Clock Infrastructure
//!
//! Wall-clock time sources for the engine:
//!
//! - [`SystemClock`]: real UTC time, used in production
//! - [`ManualClock`]: frozen time that only moves when told to, used in tests
//!
//! ## Usage
//!
//! ```ignore
//! use talos_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::starting_now();
//! let before = clock.now();
//! clock.advance(Duration::minutes(5));
//! assert_eq!(clock.now() - before, Duration::minutes(5));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use talos_ports::Clock;
