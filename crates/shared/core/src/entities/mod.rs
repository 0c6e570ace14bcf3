mod phase;
mod quote;
mod robot;

pub use phase::{TradeLeg, TradePhase};
pub use quote::Quote;
pub use robot::{NewRobot, Robot, RobotSpecError};
