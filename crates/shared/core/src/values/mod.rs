use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Realized profit/loss, signed
pub type Yield = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Robot identifier, assigned by storage on creation
pub type RobotId = i64;

/// Owning user identifier
pub type UserId = i64;

/// Ticker symbol a robot trades
pub type Ticker = String;
