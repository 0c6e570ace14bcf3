//! Tokio channel-based price feed for single-process mode
//!
//! Uses one broadcast channel per ticker. Quotes are passed directly,
//! no serialization. Faults can be injected per ticker, which is how
//! disconnects are simulated.

use async_trait::async_trait;
use dashmap::DashMap;
use talos_core::Quote;
use talos_ports::{FeedError, FeedResult, PriceFeed, QuoteStream};
use tokio::sync::broadcast;

/// Default per-subscriber buffer
const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
enum FeedEvent {
    Quote(Quote),
    Fault(String),
}

/// In-process price feed keyed by ticker
pub struct ChannelPriceFeed {
    channels: DashMap<String, broadcast::Sender<FeedEvent>>,
    /// Tickers whose subscriptions are currently refused, with the reason
    unavailable: DashMap<String, String>,
    capacity: usize,
}

impl ChannelPriceFeed {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a feed whose subscribers buffer up to `capacity` quotes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            unavailable: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Publish a quote to every subscriber of its ticker
    ///
    /// Returns the number of subscribers reached (0 when nobody listens).
    pub fn publish(&self, quote: Quote) -> usize {
        let Some(tx) = self.channels.get(&quote.ticker) else {
            log::trace!("No subscribers for {}", quote.ticker);
            return 0;
        };
        tx.send(FeedEvent::Quote(quote)).unwrap_or(0)
    }

    /// Break every live subscription for a ticker with a fault
    pub fn disconnect(&self, ticker: &str, reason: impl Into<String>) -> usize {
        let reason = reason.into();
        log::info!("Disconnecting {} subscribers: {}", ticker, reason);
        self.channels
            .get(ticker)
            .and_then(|tx| tx.send(FeedEvent::Fault(reason)).ok())
            .unwrap_or(0)
    }

    /// Close a ticker's channel; subscribers see a natural end of stream
    pub fn close(&self, ticker: &str) {
        if self.channels.remove(ticker).is_some() {
            log::info!("Closed quote channel for {}", ticker);
        }
    }

    /// Refuse new subscriptions for a ticker until [`Self::set_available`]
    pub fn set_unavailable(&self, ticker: &str, reason: impl Into<String>) {
        self.unavailable.insert(ticker.to_string(), reason.into());
    }

    pub fn set_available(&self, ticker: &str) {
        self.unavailable.remove(ticker);
    }

    /// Number of live subscriptions for a ticker
    pub fn subscriber_count(&self, ticker: &str) -> usize {
        self.channels
            .get(ticker)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for ChannelPriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceFeed for ChannelPriceFeed {
    async fn subscribe(&self, ticker: &str) -> FeedResult<Box<dyn QuoteStream>> {
        if let Some(reason) = self.unavailable.get(ticker) {
            return Err(FeedError::Subscribe(reason.value().clone()));
        }

        let rx = self
            .channels
            .entry(ticker.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        log::debug!("New quote subscription for {}", ticker);
        Ok(Box::new(ChannelQuoteStream {
            ticker: ticker.to_string(),
            rx,
            fault: None,
        }))
    }
}

/// Subscription handed out by [`ChannelPriceFeed`]
pub struct ChannelQuoteStream {
    ticker: String,
    rx: broadcast::Receiver<FeedEvent>,
    /// Once faulted, the stream stays broken
    fault: Option<String>,
}

#[async_trait]
impl QuoteStream for ChannelQuoteStream {
    async fn next_quote(&mut self) -> FeedResult<Option<Quote>> {
        if let Some(reason) = &self.fault {
            return Err(FeedError::Disconnected(reason.clone()));
        }

        loop {
            match self.rx.recv().await {
                Ok(FeedEvent::Quote(quote)) => return Ok(Some(quote)),
                Ok(FeedEvent::Fault(reason)) => {
                    self.fault = Some(reason.clone());
                    return Err(FeedError::Disconnected(reason));
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Stale quotes are worthless, skip to the freshest ones
                    log::warn!("[{}] Quote stream lagged, skipped {} quotes", self.ticker, n);
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }
}
