use crate::error::AnalyticsError;
use crate::report::{MetricsResult, PortfolioMetrics};
use crate::settings::AnalyticsSettings;
use crate::timeline::{net_capital, solve_irr, sort_by_date};
use chrono::{DateTime, Utc};
use core_types::{matches_book, CashFlow, CashFlowKind};
use rust_decimal::Decimal;
use sources::{DividendsByTicker, Sources};
use std::collections::BTreeMap;

/// Ticker carried by the closing valuation flow of the real portfolio.
pub const PORTFOLIO_TICKER: &str = "PORTFOLIO";

/// Builds the real portfolio's cash-flow timeline and solves it for XIRR.
///
/// The builder holds no state between calls; every calculation reads its
/// trades, dividends and positions fresh from the collaborators.
#[derive(Clone)]
pub struct MetricsBuilder {
    sources: Sources,
    settings: AnalyticsSettings,
}

impl MetricsBuilder {
    pub fn new(sources: Sources, settings: AnalyticsSettings) -> Self {
        Self { sources, settings }
    }

    /// Calculates metrics for `book_filter` (empty for the whole portfolio),
    /// valued as of the current time.
    pub async fn calculate(&self, book_filter: &str) -> Result<PortfolioMetrics, AnalyticsError> {
        self.calculate_at(book_filter, Utc::now()).await
    }

    /// Calculates metrics with the closing valuation dated `now`.
    pub async fn calculate_at(
        &self,
        book_filter: &str,
        now: DateTime<Utc>,
    ) -> Result<PortfolioMetrics, AnalyticsError> {
        let book_filter = book_filter.trim();
        let label = (!book_filter.is_empty()).then(|| book_filter.to_string());
        let mut report = MetricsResult::new(label);
        let mut flows = Vec::new();

        self.collect_trade_flows(book_filter, &mut flows, &mut report)
            .await;
        self.collect_dividend_flows(book_filter, &mut flows, &mut report)
            .await?;
        self.collect_valuation(book_filter, now, &mut flows, &mut report)
            .await?;

        sort_by_date(&mut flows);
        report.irr = solve_irr(&self.settings.solver, &flows)?;

        tracing::debug!(
            book = book_filter,
            flows = flows.len(),
            irr = %report.irr,
            "Portfolio metrics calculated."
        );

        Ok(PortfolioMetrics {
            result: report,
            cash_flows: flows,
        })
    }

    /// Emits one signed flow per matching trade and totals the capital paid in.
    async fn collect_trade_flows(
        &self,
        book_filter: &str,
        flows: &mut Vec<CashFlow>,
        report: &mut MetricsResult,
    ) {
        let trades = self.sources.trades.get_trades().await;
        let start = flows.len();

        for trade in trades
            .iter()
            .filter(|t| matches_book(&t.book, book_filter, &self.settings.default_book))
        {
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
            let amount = trade.notional_in_base() * Decimal::from(trade.side.cash_sign());
            flows.push(CashFlow::new(date, amount, &trade.ticker, trade.side.into()));
        }

        report.total_price_paid = net_capital(&flows[start..]);
    }

    /// Emits one flow per dividend record, net of withholding tax and converted
    /// to the base currency at today's spot rate.
    async fn collect_dividend_flows(
        &self,
        book_filter: &str,
        flows: &mut Vec<CashFlow>,
        report: &mut MetricsResult,
    ) -> Result<(), AnalyticsError> {
        let dividends: DividendsByTicker = if book_filter.is_empty() {
            self.sources.dividends.calculate_for_all_tickers().await?
        } else {
            self.sources.dividends.calculate_for_book(book_filter).await?
        };

        let mut spot_rates: BTreeMap<String, Decimal> = BTreeMap::new();

        for (ticker, records) in &dividends {
            let currency = match self.sources.reference.get_instrument_info(ticker).await {
                Ok(info) => info.currency.to_ascii_uppercase(),
                Err(e) => {
                    tracing::warn!(
                        ticker = %ticker,
                        error = %e,
                        "No reference data for dividend ticker, skipping."
                    );
                    continue;
                }
            };

            let fx = match spot_rates.get(&currency) {
                Some(rate) => *rate,
                None => {
                    let rate = self.spot_rate(&currency).await?;
                    spot_rates.insert(currency.clone(), rate);
                    rate
                }
            };

            for record in records {
                let amount = record.total_amount * record.net_factor() * fx;
                report.total_dividends += amount;
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

    /// Values the matching positions in the base currency as one closing flow.
    async fn collect_valuation(
        &self,
        book_filter: &str,
        now: DateTime<Utc>,
        flows: &mut Vec<CashFlow>,
        report: &mut MetricsResult,
    ) -> Result<(), AnalyticsError> {
        let positions = self.sources.positions.get_all_positions().await?;

        report.market_value = positions
            .iter()
            .filter(|p| matches_book(&p.book, book_filter, &self.settings.default_book))
            .map(|p| p.market_value_in_base())
            .sum();

        flows.push(CashFlow::new(
            now,
            report.market_value,
            PORTFOLIO_TICKER,
            CashFlowKind::Valuation,
        ));
        Ok(())
    }

    async fn spot_rate(&self, currency: &str) -> Result<Decimal, AnalyticsError> {
        if currency.eq_ignore_ascii_case(&self.settings.base_currency) {
            return Ok(Decimal::ONE);
        }
        let pair = format!("{}-{}", currency, self.settings.base_currency);
        let spot = self.sources.market.get_spot_price(&pair).await?;
        Ok(spot.price)
    }
}
