use serde::{Deserialize, Serialize};

use crate::values::{Price, Ticker};

/// A single price tick from the feed
///
/// `buy_price` is what a robot pays to open a position,
/// `sell_price` is what it receives when closing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: Ticker,
    pub buy_price: Price,
    pub sell_price: Price,
}

impl Quote {
    pub fn new(ticker: impl Into<Ticker>, buy_price: Price, sell_price: Price) -> Self {
        Self {
            ticker: ticker.into(),
            buy_price,
            sell_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_new() {
        let quote = Quote::new("AAPL", dec!(101.5), dec!(100.5));
        assert_eq!(quote.ticker, "AAPL");
        assert_eq!(quote.buy_price, dec!(101.5));
        assert_eq!(quote.sell_price, dec!(100.5));
    }
}
