use serde::{Deserialize, Serialize};

use super::{Quote, Robot};
use crate::values::Price;

/// Position state of a running robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradePhase {
    /// Holding no position, waiting for a buy trigger
    #[default]
    Sold,
    /// Holding a position, waiting for a sell trigger
    Bought,
}

/// A completed buy or sell execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeLeg {
    Buy { price: Price },
    Sell { price: Price },
}

impl TradePhase {
    /// Decide whether `quote` crosses the robot's trigger for the current phase
    ///
    /// - `Sold`: buys when the quote's buy price is at or below the robot's buy trigger
    /// - `Bought`: sells when the quote's sell price is at or above the robot's sell trigger
    pub fn evaluate(self, robot: &Robot, quote: &Quote) -> Option<TradeLeg> {
        match self {
            TradePhase::Sold if quote.buy_price <= robot.buy_price => Some(TradeLeg::Buy {
                price: quote.buy_price,
            }),
            TradePhase::Bought if quote.sell_price >= robot.sell_price => Some(TradeLeg::Sell {
                price: quote.sell_price,
            }),
            _ => None,
        }
    }
}

impl TradeLeg {
    /// Phase the robot is in once this leg completes
    pub fn next_phase(&self) -> TradePhase {
        match self {
            TradeLeg::Buy { .. } => TradePhase::Bought,
            TradeLeg::Sell { .. } => TradePhase::Sold,
        }
    }

    /// Apply the leg to a robot's counters
    ///
    /// A buy spends the price and counts a deal, a sell books the price back.
    pub fn apply(&self, robot: &mut Robot) {
        match *self {
            TradeLeg::Buy { price } => {
                robot.fact_yield -= price;
                robot.deals_count += 1;
            }
            TradeLeg::Sell { price } => {
                robot.fact_yield += price;
            }
        }
    }

    pub fn price(&self) -> Price {
        match *self {
            TradeLeg::Buy { price } | TradeLeg::Sell { price } => price,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, TradeLeg::Buy { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::NewRobot;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn robot(buy: Price, sell: Price) -> Robot {
        let now = Utc::now();
        let draft = NewRobot::new(1, "AAPL", buy, sell, now, now + Duration::hours(1));
        Robot::from_new(7, draft, now)
    }

    fn quote(buy: Price, sell: Price) -> Quote {
        Quote::new("AAPL", buy, sell)
    }

    #[test]
    fn test_sold_buys_at_or_below_trigger() {
        let r = robot(dec!(100), dec!(110));

        assert_eq!(TradePhase::Sold.evaluate(&r, &quote(dec!(105), dec!(112))), None);
        assert_eq!(
            TradePhase::Sold.evaluate(&r, &quote(dec!(100), dec!(90))),
            Some(TradeLeg::Buy { price: dec!(100) })
        );
        assert_eq!(
            TradePhase::Sold.evaluate(&r, &quote(dec!(99), dec!(112))),
            Some(TradeLeg::Buy { price: dec!(99) })
        );
    }

    #[test]
    fn test_bought_sells_at_or_above_trigger() {
        let r = robot(dec!(100), dec!(110));

        assert_eq!(TradePhase::Bought.evaluate(&r, &quote(dec!(50), dec!(109))), None);
        assert_eq!(
            TradePhase::Bought.evaluate(&r, &quote(dec!(50), dec!(110))),
            Some(TradeLeg::Sell { price: dec!(110) })
        );
    }

    #[test]
    fn test_sold_ignores_sell_side() {
        // A high sell price must not trigger anything while flat
        let r = robot(dec!(100), dec!(110));
        assert_eq!(TradePhase::Sold.evaluate(&r, &quote(dec!(101), dec!(500))), None);
    }

    #[test]
    fn test_example_cycle() {
        let mut r = robot(dec!(100), dec!(110));
        let mut phase = TradePhase::Sold;

        for q in [
            quote(dec!(105), dec!(112)),
            quote(dec!(99), dec!(112)),
            quote(dec!(99), dec!(111)),
        ] {
            if let Some(leg) = phase.evaluate(&r, &q) {
                leg.apply(&mut r);
                phase = leg.next_phase();
            }
        }

        assert_eq!(r.fact_yield, dec!(12));
        assert_eq!(r.deals_count, 1);
        assert_eq!(phase, TradePhase::Sold);
    }

    #[test]
    fn test_deals_count_only_grows_on_buy() {
        let mut r = robot(dec!(100), dec!(110));

        TradeLeg::Sell { price: dec!(120) }.apply(&mut r);
        assert_eq!(r.deals_count, 0);
        assert_eq!(r.fact_yield, dec!(120));

        TradeLeg::Buy { price: dec!(95) }.apply(&mut r);
        assert_eq!(r.deals_count, 1);
        assert_eq!(r.fact_yield, dec!(25));
    }
}
