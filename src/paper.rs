//! Paper-trading state machine
//!
//! Simulated portfolio with exact decimal arithmetic. `execute` is
//! all-or-nothing: every guard runs before any balance is touched, and
//! a rejected trade leaves the portfolio byte-identical. The caller is
//! the single runner task, so no internal locking is needed.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::scoring::{Action, CombinedSignal};

#[derive(Debug, Error, PartialEq)]
pub enum TradeError {
    #[error("cooldown active, {remaining_secs}s remaining")]
    CooldownActive { remaining_secs: i64 },
    #[error("invalid price: {0}")]
    InvalidPrice(f64),
    #[error("no BTC position to sell")]
    NothingToSell,
    #[error("no USD available to buy")]
    NoFunds,
    #[error("price change below minimum threshold")]
    PriceChangeTooSmall,
    #[error("profit target not met")]
    ProfitTargetNotMet,
    #[error("insufficient funds for trade plus fee")]
    InsufficientFunds,
    #[error("hold signal, nothing to execute")]
    NotActionable,
}

/// Simulation parameters; percentages are fractions (0.005 = 0.5%)
#[derive(Debug, Clone)]
pub struct TradeRules {
    pub fee_pct: Decimal,
    pub min_trade_interval_secs: i64,
    pub min_price_change_pct: Decimal,
    pub profit_target_pct: Decimal,
    pub max_trade_fraction: Decimal,
}

impl Default for TradeRules {
    fn default() -> Self {
        Self {
            fee_pct: Decimal::new(5, 3),              // 0.5%
            min_trade_interval_secs: 300,
            min_price_change_pct: Decimal::new(1, 3), // 0.1%
            profit_target_pct: Decimal::new(3, 2),    // 3%
            max_trade_fraction: Decimal::new(5, 2),   // 5%
        }
    }
}

/// Append-only record of one executed trade
#[derive(Debug, Clone, Serialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub time: DateTime<Utc>,
    pub action: Action,
    pub price: Decimal,
    pub amount_btc: Decimal,
    pub amount_usd: Decimal,
    pub fee: Decimal,
    pub balance_btc: Decimal,
    pub balance_usd: Decimal,
    pub profit: Option<Decimal>,
}

pub struct PaperTrader {
    rules: TradeRules,
    initial_capital: Decimal,
    usd_balance: Decimal,
    btc_balance: Decimal,
    average_buy_price: Option<Decimal>,
    last_trade_time: Option<DateTime<Utc>>,
    last_trade_price: Option<Decimal>,
    trades: Vec<TradeRecord>,
    total_profit: Decimal,
}

impl PaperTrader {
    pub fn new(initial_usd: Decimal, initial_btc: Decimal, rules: TradeRules) -> Self {
        Self {
            rules,
            initial_capital: initial_usd,
            usd_balance: initial_usd,
            btc_balance: initial_btc,
            average_buy_price: None,
            last_trade_time: None,
            last_trade_price: None,
            trades: Vec::new(),
            total_profit: Decimal::ZERO,
        }
    }

    /// Record an entry price for a portfolio seeded with BTC, so the
    /// profit target has a cost basis to measure against
    pub fn with_entry_price(mut self, price: Decimal) -> Self {
        if self.btc_balance > Decimal::ZERO {
            self.average_buy_price = Some(price);
        }
        self
    }

    pub fn usd_balance(&self) -> Decimal {
        self.usd_balance
    }

    pub fn btc_balance(&self) -> Decimal {
        self.btc_balance
    }

    pub fn average_buy_price(&self) -> Option<Decimal> {
        self.average_buy_price
    }

    pub fn total_profit(&self) -> Decimal {
        self.total_profit
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// Portfolio value at the given mark price
    pub fn equity(&self, price: Decimal) -> Decimal {
        self.usd_balance + self.btc_balance * price
    }

    pub fn execute(&mut self, signal: &CombinedSignal) -> Result<TradeRecord, TradeError> {
        self.execute_at(signal, Utc::now())
    }

    /// Run one signal against the portfolio at an explicit clock
    /// reading. All guards complete before any state changes.
    pub fn execute_at(
        &mut self,
        signal: &CombinedSignal,
        now: DateTime<Utc>,
    ) -> Result<TradeRecord, TradeError> {
        let action = signal.action;
        if action == Action::Hold {
            return Err(TradeError::NotActionable);
        }

        if let Some(last) = self.last_trade_time {
            let elapsed = now - last;
            let cooldown = ChronoDuration::seconds(self.rules.min_trade_interval_secs);
            if elapsed < cooldown {
                return Err(TradeError::CooldownActive {
                    remaining_secs: (cooldown - elapsed).num_seconds(),
                });
            }
        }

        let price = Decimal::from_f64(signal.price)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or(TradeError::InvalidPrice(signal.price))?;

        match action {
            Action::Sell if self.btc_balance <= Decimal::ZERO => {
                return Err(TradeError::NothingToSell)
            }
            Action::Buy if self.usd_balance <= Decimal::ZERO => return Err(TradeError::NoFunds),
            _ => {}
        }

        if let Some(last_price) = self.last_trade_price {
            if last_price > Decimal::ZERO {
                let change = ((price - last_price) / last_price).abs();
                if change < self.rules.min_price_change_pct {
                    return Err(TradeError::PriceChangeTooSmall);
                }
            }
        }

        let record = match action {
            Action::Buy => self.buy(price, now)?,
            Action::Sell => self.sell(price, now)?,
            Action::Hold => unreachable!(),
        };

        self.last_trade_time = Some(now);
        self.last_trade_price = Some(price);
        info!(
            "{} {} BTC at {} (fee {}), balances: {} USD / {} BTC",
            record.action, record.amount_btc, record.price, record.fee,
            record.balance_usd, record.balance_btc,
        );
        self.trades.push(record.clone());
        Ok(record)
    }

    fn buy(&mut self, price: Decimal, now: DateTime<Utc>) -> Result<TradeRecord, TradeError> {
        let cap = self.initial_capital * self.rules.max_trade_fraction;
        let trade_usd = self.usd_balance.min(cap);
        let fee = trade_usd * self.rules.fee_pct;
        if trade_usd + fee > self.usd_balance {
            return Err(TradeError::InsufficientFunds);
        }
        let amount_btc = trade_usd / price;

        self.usd_balance -= trade_usd + fee;
        self.btc_balance += amount_btc;
        self.average_buy_price = Some(match self.average_buy_price {
            Some(old) => (old + price) / Decimal::TWO,
            None => price,
        });

        Ok(TradeRecord {
            id: Uuid::new_v4(),
            time: now,
            action: Action::Buy,
            price,
            amount_btc,
            amount_usd: trade_usd,
            fee,
            balance_btc: self.btc_balance,
            balance_usd: self.usd_balance,
            profit: None,
        })
    }

    fn sell(&mut self, price: Decimal, now: DateTime<Utc>) -> Result<TradeRecord, TradeError> {
        // a seeded position with no recorded entry has no basis to
        // hold a profit target against, so only enforce one when an
        // average exists
        if let Some(avg) = self.average_buy_price {
            let target = avg * (Decimal::ONE + self.rules.profit_target_pct);
            if price < target {
                return Err(TradeError::ProfitTargetNotMet);
            }
        }
        let avg_buy = self.average_buy_price.unwrap_or(price);

        // Full position exit
        let amount_btc = self.btc_balance;
        let revenue = price * amount_btc;
        let fee = revenue * self.rules.fee_pct;
        let net = revenue - fee;
        let profit = (price - avg_buy) * amount_btc - fee;

        self.usd_balance += net;
        self.btc_balance = Decimal::ZERO;
        self.average_buy_price = None;
        self.total_profit += profit;

        Ok(TradeRecord {
            id: Uuid::new_v4(),
            time: now,
            action: Action::Sell,
            price,
            amount_btc,
            amount_usd: net,
            fee,
            balance_btc: self.btc_balance,
            balance_usd: self.usd_balance,
            profit: Some(profit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signal(action: Action, price: f64) -> CombinedSignal {
        CombinedSignal {
            action,
            confidence: 0.8,
            price,
            components: serde_json::Value::Null,
        }
    }

    fn trader() -> PaperTrader {
        PaperTrader::new(Decimal::from(10_000), Decimal::ZERO, TradeRules::default())
    }

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn buy_arithmetic_is_exact() {
        let mut trader = trader();
        let record = trader.execute_at(&signal(Action::Buy, 50_000.0), t0()).unwrap();

        assert_eq!(record.amount_usd, Decimal::from(500));
        assert_eq!(record.fee, Decimal::new(25, 1)); // 2.50
        assert_eq!(record.amount_btc, Decimal::new(1, 2)); // 0.01
        assert_eq!(trader.usd_balance(), Decimal::new(94975, 1)); // 9497.5
        assert_eq!(trader.btc_balance(), Decimal::new(1, 2));
        assert_eq!(trader.average_buy_price(), Some(Decimal::from(50_000)));
    }

    #[test]
    fn sell_arithmetic_is_exact() {
        let mut trader = trader();
        trader.execute_at(&signal(Action::Buy, 50_000.0), t0()).unwrap();
        let later = t0() + ChronoDuration::seconds(600);
        let record = trader.execute_at(&signal(Action::Sell, 55_000.0), later).unwrap();

        // revenue 550, fee 2.75, net 547.25
        assert_eq!(record.fee, Decimal::new(275, 2));
        assert_eq!(record.amount_usd, Decimal::new(54725, 2));
        assert_eq!(trader.usd_balance(), Decimal::new(94975, 1) + Decimal::new(54725, 2));
        assert_eq!(trader.btc_balance(), Decimal::ZERO);
        // profit = (55000 - 50000) * 0.01 - 2.75 = 47.25
        assert_eq!(record.profit, Some(Decimal::new(4725, 2)));
        assert_eq!(trader.total_profit(), Decimal::new(4725, 2));
        assert_eq!(trader.average_buy_price(), None);
    }

    #[test]
    fn cooldown_rejects_then_accepts() {
        let mut trader = trader();
        trader.execute_at(&signal(Action::Buy, 50_000.0), t0()).unwrap();

        let too_soon = t0() + ChronoDuration::seconds(299);
        let err = trader.execute_at(&signal(Action::Buy, 51_000.0), too_soon).unwrap_err();
        assert!(matches!(err, TradeError::CooldownActive { .. }));

        let after = t0() + ChronoDuration::seconds(300);
        assert!(trader.execute_at(&signal(Action::Buy, 51_000.0), after).is_ok());
    }

    #[test]
    fn sell_without_position_is_rejected_without_mutation() {
        let mut trader = trader();
        let before = trader.usd_balance();
        let err = trader.execute_at(&signal(Action::Sell, 50_000.0), t0()).unwrap_err();
        assert_eq!(err, TradeError::NothingToSell);
        assert_eq!(trader.usd_balance(), before);
        assert!(trader.trades().is_empty());
    }

    #[test]
    fn invalid_prices_are_rejected() {
        let mut trader = trader();
        for price in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = trader.execute_at(&signal(Action::Buy, price), t0()).unwrap_err();
            assert!(matches!(err, TradeError::InvalidPrice(_)), "price {price}");
        }
        assert!(trader.trades().is_empty());
    }

    #[test]
    fn tiny_price_move_is_rejected() {
        let mut trader = trader();
        trader.execute_at(&signal(Action::Buy, 50_000.0), t0()).unwrap();
        let later = t0() + ChronoDuration::seconds(600);
        // 0.05% move, below the 0.1% minimum
        let err = trader.execute_at(&signal(Action::Buy, 50_025.0), later).unwrap_err();
        assert_eq!(err, TradeError::PriceChangeTooSmall);
    }

    #[test]
    fn sell_below_profit_target_is_rejected() {
        let mut trader = trader();
        trader.execute_at(&signal(Action::Buy, 50_000.0), t0()).unwrap();
        let later = t0() + ChronoDuration::seconds(600);
        // +2% move, short of the 3% target
        let err = trader.execute_at(&signal(Action::Sell, 51_000.0), later).unwrap_err();
        assert_eq!(err, TradeError::ProfitTargetNotMet);
        assert_eq!(trader.btc_balance(), Decimal::new(1, 2));
    }

    #[test]
    fn repeat_buy_averages_entry_price() {
        let mut trader = trader();
        trader.execute_at(&signal(Action::Buy, 50_000.0), t0()).unwrap();
        let later = t0() + ChronoDuration::seconds(600);
        trader.execute_at(&signal(Action::Buy, 60_000.0), later).unwrap();
        assert_eq!(trader.average_buy_price(), Some(Decimal::from(55_000)));
    }

    #[test]
    fn seeded_position_sells_without_a_recorded_entry() {
        let mut trader =
            PaperTrader::new(Decimal::from(10_000), Decimal::new(5, 1), TradeRules::default());
        // no entry price on record, so no profit target applies
        let record = trader.execute_at(&signal(Action::Sell, 50_000.0), t0()).unwrap();

        assert_eq!(record.amount_btc, Decimal::new(5, 1));
        assert_eq!(trader.btc_balance(), Decimal::ZERO);
        // revenue 25000, fee 125, net 24875; profit is just -fee
        assert_eq!(record.amount_usd, Decimal::from(24_875));
        assert_eq!(record.profit, Some(Decimal::from(-125)));
    }

    #[test]
    fn seeded_position_honors_configured_entry_price() {
        let seeded = || {
            PaperTrader::new(Decimal::from(10_000), Decimal::new(5, 1), TradeRules::default())
                .with_entry_price(Decimal::from(50_000))
        };

        // +2% move, short of the 3% target
        let err = seeded().execute_at(&signal(Action::Sell, 51_000.0), t0()).unwrap_err();
        assert_eq!(err, TradeError::ProfitTargetNotMet);

        let mut trader = seeded();
        let record = trader.execute_at(&signal(Action::Sell, 52_000.0), t0()).unwrap();
        // profit = (52000 - 50000) * 0.5 - 130 fee
        assert_eq!(record.profit, Some(Decimal::from(870)));
    }

    #[test]
    fn entry_price_is_ignored_without_a_position() {
        let trader =
            PaperTrader::new(Decimal::from(10_000), Decimal::ZERO, TradeRules::default())
                .with_entry_price(Decimal::from(50_000));
        assert_eq!(trader.average_buy_price(), None);
    }

    #[test]
    fn hold_is_not_actionable() {
        let mut trader = trader();
        let err = trader.execute_at(&signal(Action::Hold, 50_000.0), t0()).unwrap_err();
        assert_eq!(err, TradeError::NotActionable);
    }

    #[test]
    fn buy_caps_at_fraction_of_initial_capital() {
        let mut trader = trader();
        let record = trader.execute_at(&signal(Action::Buy, 50_000.0), t0()).unwrap();
        // 5% of 10000, regardless of remaining balance
        assert_eq!(record.amount_usd, Decimal::from(500));
        let later = t0() + ChronoDuration::seconds(600);
        let record = trader.execute_at(&signal(Action::Buy, 51_000.0), later).unwrap();
        assert_eq!(record.amount_usd, Decimal::from(500));
    }
}
