use crate::comparator::Winner;
use core_types::CashFlow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Money-weighted performance of the real portfolio (or one book of it).
///
/// This is the payload of `GET /api/v1/metrics` and the portfolio half of a
/// benchmark comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    /// Annualized XIRR as a fraction.
    pub irr: Decimal,
    /// Net capital put in: the negated sum of all buy and sell flows.
    pub total_price_paid: Decimal,
    pub market_value: Decimal,
    pub total_dividends: Decimal,
    /// The book the figures were restricted to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MetricsResult {
    /// Creates a new, zeroed-out result.
    pub fn new(label: Option<String>) -> Self {
        Self {
            irr: Decimal::ZERO,
            total_price_paid: Decimal::ZERO,
            market_value: Decimal::ZERO,
            total_dividends: Decimal::ZERO,
            label,
        }
    }
}

impl Default for MetricsResult {
    fn default() -> Self {
        Self::new(None)
    }
}

/// A `MetricsResult` together with the timeline it was solved from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub result: MetricsResult,
    pub cash_flows: Vec<CashFlow>,
}

/// Performance of the synthetic benchmark basket.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub irr: Decimal,
    pub price_paid: Decimal,
    pub market_value: Decimal,
    pub fees: Decimal,
    pub dividends: Decimal,
}

/// The outcome of `POST /api/v1/metrics/benchmark`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparisonResult {
    pub portfolio: MetricsResult,
    pub benchmark: BenchmarkResult,
    /// Portfolio IRR minus benchmark IRR.
    pub irr_difference: Decimal,
    pub winner: Winner,
    pub benchmark_cash_flows: Vec<CashFlow>,
}
