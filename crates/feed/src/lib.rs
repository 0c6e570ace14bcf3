//! Talos Feed
//!
//! Price feed adapters implementing the [`talos_ports::PriceFeed`] port.
//!
//! ## Architecture
//!
//! ```text
//!   QuoteSimulator / external bridge
//!              │ publish(quote)
//!              ▼
//!     ┌──────────────────┐
//!     │ ChannelPriceFeed │  one broadcast channel per ticker
//!     └────────┬─────────┘
//!              │ subscribe(ticker)
//!              ▼
//!     ChannelQuoteStream (one per execution task)
//! ```

pub mod channel;
pub mod simulator;

pub use channel::{ChannelPriceFeed, ChannelQuoteStream};
pub use simulator::{QuoteSimulator, SimulatorConfig};
