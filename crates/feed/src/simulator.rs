//! Quote Simulator - random-walk price source
//!
//! Walks a mid price per ticker and publishes a two-sided quote
//! (`mid + spread/2`, `mid - spread/2`) into a [`ChannelPriceFeed`].

use crate::channel::ChannelPriceFeed;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use talos_core::Quote;

/// Lowest mid price the walk is allowed to reach
const MIN_MID: Decimal = dec!(0.01);

/// Configuration for quote simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Initial mid price per ticker
    pub tickers: BTreeMap<String, Decimal>,
    /// Max relative move per tick (e.g. 0.002 = 0.2%)
    pub volatility: Decimal,
    /// Absolute distance between buy and sell price
    pub spread: Decimal,
    /// Delay between ticks
    pub interval_ms: u64,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        let mut tickers = BTreeMap::new();
        tickers.insert("SBER".to_string(), dec!(250));
        tickers.insert("GAZP".to_string(), dec!(160));

        Self {
            tickers,
            volatility: dec!(0.002),
            spread: dec!(0.2),
            interval_ms: 500,
            seed: None,
        }
    }
}

/// Generates random-walk quotes
pub struct QuoteSimulator {
    mids: BTreeMap<String, Decimal>,
    config: SimulatorConfig,
    feed: Arc<ChannelPriceFeed>,
    rng: StdRng,
}

impl QuoteSimulator {
    pub fn new(config: SimulatorConfig, feed: Arc<ChannelPriceFeed>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            mids: config.tickers.clone(),
            config,
            feed,
            rng,
        }
    }

    /// Current mid price for a ticker
    pub fn mid(&self, ticker: &str) -> Option<Decimal> {
        self.mids.get(ticker).copied()
    }

    /// Advance every ticker one step and return the new quotes
    pub fn next_quotes(&mut self) -> Vec<Quote> {
        let vol = self.config.volatility.to_f64().unwrap_or(0.0);
        let half_spread = self.config.spread / dec!(2);

        let mut quotes = Vec::with_capacity(self.mids.len());
        for (ticker, mid) in self.mids.iter_mut() {
            let change_pct: f64 = self.rng.gen_range(-1.0..=1.0);
            let factor = Decimal::from_f64_retain(1.0 + vol * change_pct).unwrap_or(Decimal::ONE);
            *mid = (*mid * factor).round_dp(2).max(MIN_MID);

            quotes.push(Quote::new(
                ticker.clone(),
                *mid + half_spread,
                (*mid - half_spread).max(Decimal::ZERO),
            ));
        }
        quotes
    }

    /// Generate and publish one round of quotes
    pub fn tick(&mut self) -> Vec<Quote> {
        let quotes = self.next_quotes();
        for quote in &quotes {
            self.feed.publish(quote.clone());
        }
        quotes
    }

    /// Publish quotes forever at the configured interval
    ///
    /// Runs until the surrounding task is dropped or aborted.
    pub async fn run(mut self) {
        let period = Duration::from_millis(self.config.interval_ms.max(1));
        let mut interval = tokio::time::interval(period);
        log::info!(
            "Quote simulator started: {} tickers every {:?}",
            self.mids.len(),
            period
        );

        loop {
            interval.tick().await;
            for quote in self.tick() {
                log::trace!(
                    "{} buy={} sell={}",
                    quote.ticker,
                    quote.buy_price,
                    quote.sell_price
                );
            }
        }
    }
}
