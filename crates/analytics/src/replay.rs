use crate::basket::{leg_fee, Cost, WeightedTicker};
use crate::error::AnalyticsError;
use crate::position::SyntheticPosition;
use crate::price_cache::PriceCache;
use crate::report::BenchmarkResult;
use crate::timeline::{solve_irr, sort_by_date};
use chrono::{DateTime, Utc};
use core_types::{CashFlow, CashFlowKind, DividendRecord, Trade, TradeSide};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use xirr::XirrSolver;

/// Ticker carried by the closing valuation flow of the synthetic basket.
pub const BENCHMARK_TICKER: &str = "BENCHMARK";

/// How capital is fed into the benchmark basket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplayMode {
    /// One lump allocation of `notional` at the earliest trade date.
    BuyAtStart { notional: Decimal },
    /// Mirror the notional of every real trade on its own date.
    MatchTrades,
}

impl ReplayMode {
    /// Parses the request literal. Only `buy_at_start` and `match_trades` are accepted.
    pub fn parse(mode: &str, notional: Option<Decimal>) -> Result<Self, AnalyticsError> {
        match mode {
            "buy_at_start" => match notional {
                Some(notional) if notional > Decimal::ZERO => {
                    Ok(ReplayMode::BuyAtStart { notional })
                }
                _ => Err(AnalyticsError::InvalidInput(
                    "buy_at_start requires a positive notional".to_string(),
                )),
            },
            "match_trades" => Ok(ReplayMode::MatchTrades),
            other => Err(AnalyticsError::UnsupportedMode(other.to_string())),
        }
    }
}

/// Everything a replay produced.
#[derive(Debug, Clone)]
pub struct BenchmarkOutcome {
    pub result: BenchmarkResult,
    pub cash_flows: Vec<CashFlow>,
    pub positions: BTreeMap<String, SyntheticPosition>,
}

/// Replays capital events against a weighted basket using cached prices.
///
/// Pure computation: every price comes from the `PriceCache`, every dividend
/// from the schedules handed to `run`.
pub struct Replay<'a> {
    basket: &'a [WeightedTicker],
    cost: Cost,
    cache: &'a PriceCache,
    solver: XirrSolver,
    now: DateTime<Utc>,
}

impl<'a> Replay<'a> {
    pub fn new(
        basket: &'a [WeightedTicker],
        cost: Cost,
        cache: &'a PriceCache,
        solver: XirrSolver,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            basket,
            cost,
            cache,
            solver,
            now,
        }
    }

    /// Runs the replay and solves the resulting timeline.
    ///
    /// `dividends` holds per-share schedules keyed by ticker; only basket
    /// tickers are consulted.
    pub fn run(
        &self,
        trades: &[Trade],
        mode: &ReplayMode,
        dividends: &BTreeMap<String, Vec<DividendRecord>>,
    ) -> Result<BenchmarkOutcome, AnalyticsError> {
        if self.basket.len() < 2 {
            return Err(AnalyticsError::InvalidInput(
                "benchmark basket needs at least two tickers".to_string(),
            ));
        }
        let start = trades
            .iter()
            .filter_map(|t| t.parsed_date().ok())
            .min()
            .ok_or(AnalyticsError::NoTradesAvailable)?;

        let mut result = BenchmarkResult::default();
        let mut flows = Vec::new();
        let mut positions: BTreeMap<String, SyntheticPosition> = BTreeMap::new();

        match *mode {
            ReplayMode::BuyAtStart { notional } => {
                self.buy_at_start(notional, start, &mut positions, &mut flows, &mut result)?
            }
            ReplayMode::MatchTrades => {
                self.match_trades(trades, &mut positions, &mut flows, &mut result)?
            }
        }

        for position in positions.values_mut() {
            position.sort_events();
        }
        self.inject_dividends(dividends, &positions, &mut flows, &mut result)?;
        self.value_at_end(&positions, &mut flows, &mut result)?;

        sort_by_date(&mut flows);
        result.irr = solve_irr(&self.solver, &flows)?;

        tracing::debug!(
            mode = ?mode,
            flows = flows.len(),
            irr = %result.irr,
            "Benchmark replay finished."
        );

        Ok(BenchmarkOutcome {
            result,
            cash_flows: flows,
            positions,
        })
    }

    fn buy_at_start(
        &self,
        notional: Decimal,
        start: DateTime<Utc>,
        positions: &mut BTreeMap<String, SyntheticPosition>,
        flows: &mut Vec<CashFlow>,
        result: &mut BenchmarkResult,
    ) -> Result<(), AnalyticsError> {
        if notional <= Decimal::ZERO {
            return Err(AnalyticsError::InvalidInput(format!(
                "buy_at_start notional must be positive, got {notional}"
            )));
        }

        let fee = self.cost.fee(notional);
        for leg in self.basket {
            let allocation = notional * leg.weight_decimal();
            let quantity = self.quantity_for(&leg.ticker, allocation, start)?;
            positions
                .entry(leg.ticker.clone())
                .or_default()
                .record(start, quantity);
            flows.push(CashFlow::new(
                start,
                -(allocation + leg_fee(fee, leg)),
                &leg.ticker,
                CashFlowKind::Buy,
            ));
        }

        result.price_paid = notional + fee;
        result.fees = fee;
        Ok(())
    }

    fn match_trades(
        &self,
        trades: &[Trade],
        positions: &mut BTreeMap<String, SyntheticPosition>,
        flows: &mut Vec<CashFlow>,
        result: &mut BenchmarkResult,
    ) -> Result<(), AnalyticsError> {
        for trade in trades {
            let date = match trade.parsed_date() {
                Ok(date) => date,
                Err(e) => {
                    tracing::warn!(
                        ticker = %trade.ticker,
                        raw = %trade.trade_date,
                        error = %e,
                        "Skipping trade with unparseable date."
                    );
                    continue;
                }
            };
            let notional = trade.notional_in_base().abs();
            if notional.is_zero() {
                continue;
            }

            let fee = self.cost.fee(notional);
            result.fees += fee;
            match trade.side {
                TradeSide::Buy => result.price_paid += notional + fee,
                TradeSide::Sell => result.price_paid -= notional - fee,
            }

            for leg in self.basket {
                let allocation = notional * leg.weight_decimal();
                let leg_cost = leg_fee(fee, leg);
                let delta = self.quantity_for(&leg.ticker, allocation, date)?;
                let position = positions.entry(leg.ticker.clone()).or_default();
                match trade.side {
                    TradeSide::Buy => {
                        position.record(date, delta);
                        flows.push(CashFlow::new(
                            date,
                            -(allocation + leg_cost),
                            &leg.ticker,
                            CashFlowKind::Buy,
                        ));
                    }
                    TradeSide::Sell => {
                        position.record(date, -delta);
                        flows.push(CashFlow::new(
                            date,
                            allocation - leg_cost,
                            &leg.ticker,
                            CashFlowKind::Sell,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Pays each basket dividend on the synthetic quantity held at its ex-date.
    fn inject_dividends(
        &self,
        dividends: &BTreeMap<String, Vec<DividendRecord>>,
        positions: &BTreeMap<String, SyntheticPosition>,
        flows: &mut Vec<CashFlow>,
        result: &mut BenchmarkResult,
    ) -> Result<(), AnalyticsError> {
        for (ticker, position) in positions {
            let Some(records) = dividends.get(ticker) else {
                continue;
            };
            let currency = self
                .cache
                .currency_of(ticker)
                .unwrap_or(self.cache.base_currency());

            for record in records {
                if record.ex_date > self.now {
                    continue;
                }
                let held = position.quantity_as_of(record.ex_date);
                if held <= Decimal::ZERO {
                    continue;
                }
                let fx = self.cache.fx_rate_at(currency, record.ex_date)?;
                let amount = held * record.amount_per_share * record.net_factor() * fx;
                result.dividends += amount;
                flows.push(CashFlow::new(
                    record.ex_date,
                    amount,
                    ticker,
                    CashFlowKind::Dividend,
                ));
            }
        }
        Ok(())
    }

    fn value_at_end(
        &self,
        positions: &BTreeMap<String, SyntheticPosition>,
        flows: &mut Vec<CashFlow>,
        result: &mut BenchmarkResult,
    ) -> Result<(), AnalyticsError> {
        for (ticker, position) in positions.iter().filter(|(_, p)| !p.is_empty()) {
            result.market_value += position.quantity() * self.cache.price_at(ticker, self.now)?;
        }
        flows.push(CashFlow::new(
            self.now,
            result.market_value,
            BENCHMARK_TICKER,
            CashFlowKind::Valuation,
        ));
        Ok(())
    }

    /// Units of `ticker` that `allocation` buys on `date`; zero if the price is not positive.
    fn quantity_for(
        &self,
        ticker: &str,
        allocation: Decimal,
        date: DateTime<Utc>,
    ) -> Result<Decimal, AnalyticsError> {
        let price = self.cache.price_at(ticker, date)?;
        if price <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        Ok(allocation.checked_div(price).unwrap_or(Decimal::ZERO))
    }
}
