use crate::basket::{normalize, Cost, WeightedTicker};
use crate::comparator::compare;
use crate::error::AnalyticsError;
use crate::metrics::MetricsBuilder;
use crate::price_cache::PriceCache;
use crate::replay::{Replay, ReplayMode};
use crate::report::BenchmarkComparisonResult;
use crate::settings::AnalyticsSettings;
use chrono::{DateTime, Utc};
use core_types::{matches_book, DividendRecord, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sources::Sources;
use std::collections::BTreeMap;

/// The body of `POST /api/v1/metrics/benchmark`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRequest {
    #[serde(default)]
    pub book_filter: String,
    pub benchmark_tickers: Vec<WeightedTicker>,
    /// `buy_at_start` or `match_trades`.
    pub mode: String,
    #[serde(default)]
    pub notional: Option<Decimal>,
    #[serde(default)]
    pub benchmark_cost: Cost,
}

/// Compares the real portfolio against a replayed benchmark basket.
#[derive(Clone)]
pub struct BenchmarkEngine {
    sources: Sources,
    settings: AnalyticsSettings,
    metrics: MetricsBuilder,
}

impl BenchmarkEngine {
    pub fn new(sources: Sources, settings: AnalyticsSettings) -> Self {
        let metrics = MetricsBuilder::new(sources.clone(), settings.clone());
        Self {
            sources,
            settings,
            metrics,
        }
    }

    pub async fn compare(
        &self,
        request: &BenchmarkRequest,
    ) -> Result<BenchmarkComparisonResult, AnalyticsError> {
        self.compare_at(request, Utc::now()).await
    }

    /// Runs a comparison with both closing valuations dated `now`.
    pub async fn compare_at(
        &self,
        request: &BenchmarkRequest,
        now: DateTime<Utc>,
    ) -> Result<BenchmarkComparisonResult, AnalyticsError> {
        let mode = ReplayMode::parse(&request.mode, request.notional)?;
        request.benchmark_cost.validate()?;
        let basket = normalize(&request.benchmark_tickers)?;
        if basket.len() < 2 {
            return Err(AnalyticsError::InvalidInput(
                "benchmark basket needs at least two tickers".to_string(),
            ));
        }

        let book_filter = request.book_filter.trim();
        tracing::info!(
            book = book_filter,
            mode = ?mode,
            legs = basket.len(),
            "Running benchmark comparison."
        );

        let trades = self.book_trades(book_filter).await;
        let start = trades
            .iter()
            .filter_map(|t| t.parsed_date().ok())
            .min()
            .ok_or(AnalyticsError::NoTradesAvailable)?;

        let cache = PriceCache::build(
            &basket,
            start,
            now,
            &self.settings.base_currency,
            self.settings.price_padding_days,
            self.sources.market.as_ref(),
            self.sources.reference.as_ref(),
        )
        .await?;
        let dividends = self.basket_dividends(&basket).await?;

        let outcome = Replay::new(
            &basket,
            request.benchmark_cost,
            &cache,
            self.settings.solver,
            now,
        )
        .run(&trades, &mode, &dividends)?;

        let portfolio = self.metrics.calculate_at(book_filter, now).await?;
        let comparison = compare(portfolio.result.irr, outcome.result.irr);

        tracing::info!(
            portfolio_irr = %portfolio.result.irr,
            benchmark_irr = %outcome.result.irr,
            winner = ?comparison.winner,
            "Benchmark comparison complete."
        );

        Ok(BenchmarkComparisonResult {
            portfolio: portfolio.result,
            benchmark: outcome.result,
            irr_difference: comparison.difference,
            winner: comparison.winner,
            benchmark_cash_flows: outcome.cash_flows,
        })
    }

    async fn book_trades(&self, book_filter: &str) -> Vec<Trade> {
        self.sources
            .trades
            .get_trades()
            .await
            .into_iter()
            .filter(|t| matches_book(&t.book, book_filter, &self.settings.default_book))
            .collect()
    }

    async fn basket_dividends(
        &self,
        basket: &[WeightedTicker],
    ) -> Result<BTreeMap<String, Vec<DividendRecord>>, AnalyticsError> {
        let mut dividends = BTreeMap::new();
        for leg in basket {
            if dividends.contains_key(&leg.ticker) {
                continue;
            }
            let history = self.sources.dividends.dividend_history(&leg.ticker).await?;
            dividends.insert(leg.ticker.clone(), history);
        }
        Ok(dividends)
    }
}
