use async_trait::async_trait;
use talos_core::Quote;

use crate::error::FeedResult;

/// Port for live price data
///
/// One subscription per ticker. The port provides no reconnect logic;
/// retrying a broken subscription is the subscriber's job.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Open a quote stream for a ticker
    async fn subscribe(&self, ticker: &str) -> FeedResult<Box<dyn QuoteStream>>;
}

/// A live subscription yielding successive quotes
#[async_trait]
pub trait QuoteStream: Send {
    /// Wait for the next quote
    ///
    /// Returns `Ok(None)` once the stream closed naturally and
    /// `Err` on a disconnect or protocol fault.
    async fn next_quote(&mut self) -> FeedResult<Option<Quote>>;
}
