//! Talos Ports
//!
//! Port definitions (traits) for the Talos robot execution engine.
//! These define the boundaries between the engine and its infrastructure:
//! robot storage, the live price feed, and the time source.

mod clock;
mod error;
mod feed;
mod store;

pub use clock::Clock;
pub use error::{FeedError, FeedResult, StoreError, StoreResult};
pub use feed::{PriceFeed, QuoteStream};
pub use store::{RobotFilter, RobotStore};
