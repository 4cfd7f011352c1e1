use crate::basket::WeightedTicker;
use crate::error::AnalyticsError;
use chrono::{DateTime, Duration, Utc};
use core_types::PricePoint;
use rust_decimal::Decimal;
use sources::{MarketDataSource, ReferenceSource};
use std::collections::{BTreeMap, BTreeSet};

/// Historical prices for a benchmark basket plus the FX series needed to
/// express them in the base currency.
///
/// Built once per benchmark run and read-only afterwards. Every series is kept
/// sorted by timestamp so lookups can binary search.
#[derive(Debug, Clone, Default)]
pub struct PriceCache {
    base_currency: String,
    series: BTreeMap<String, Vec<PricePoint>>,
    currencies: BTreeMap<String, String>,
    /// FX series keyed by the foreign currency; each quotes `CCY-BASE`.
    fx: BTreeMap<String, Vec<PricePoint>>,
}

impl PriceCache {
    pub fn new(base_currency: impl Into<String>) -> Self {
        Self {
            base_currency: base_currency.into().to_ascii_uppercase(),
            ..Self::default()
        }
    }

    /// Loads every basket ticker over `[start - padding, end + padding]`,
    /// along with one FX series per distinct non-base currency.
    pub async fn build(
        basket: &[WeightedTicker],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        base_currency: &str,
        padding_days: i64,
        market: &dyn MarketDataSource,
        reference: &dyn ReferenceSource,
    ) -> Result<Self, AnalyticsError> {
        let mut cache = Self::new(base_currency);
        let from = start - Duration::days(padding_days);
        let to = end + Duration::days(padding_days);

        let mut seen = BTreeSet::new();
        for leg in basket {
            if !seen.insert(leg.ticker.as_str()) {
                continue;
            }

            let points = market.get_historical_series(&leg.ticker, from, to).await?;
            if points.is_empty() {
                return Err(AnalyticsError::NoHistoricalData(leg.ticker.clone()));
            }

            let currency = match reference.get_instrument_info(&leg.ticker).await {
                Ok(info) if !info.currency.trim().is_empty() => info.currency,
                Ok(_) | Err(_) => {
                    let fallback = points
                        .iter()
                        .map(|p| p.currency.trim())
                        .find(|c| !c.is_empty())
                        .unwrap_or(cache.base_currency.as_str())
                        .to_string();
                    tracing::warn!(
                        ticker = %leg.ticker,
                        currency = %fallback,
                        "No reference currency, using the price series currency."
                    );
                    fallback
                }
            };

            tracing::debug!(
                ticker = %leg.ticker,
                points = points.len(),
                currency = %currency,
                "Cached price series."
            );
            cache.insert_series(&leg.ticker, &currency, points);
        }

        let foreign: BTreeSet<String> = cache
            .currencies
            .values()
            .filter(|c| **c != cache.base_currency)
            .cloned()
            .collect();

        for currency in foreign {
            let pair = cache.fx_pair(&currency);
            let points = market.get_historical_series(&pair, from, to).await?;
            if points.is_empty() {
                return Err(AnalyticsError::NoHistoricalData(pair));
            }
            tracing::debug!(pair = %pair, points = points.len(), "Cached FX series.");
            cache.insert_fx(&currency, points);
        }

        Ok(cache)
    }

    pub fn insert_series(&mut self, ticker: &str, currency: &str, mut points: Vec<PricePoint>) {
        points.sort_by_key(|p| p.timestamp);
        self.series.insert(ticker.to_string(), points);
        self.currencies
            .insert(ticker.to_string(), currency.trim().to_ascii_uppercase());
    }

    pub fn insert_fx(&mut self, currency: &str, mut points: Vec<PricePoint>) {
        points.sort_by_key(|p| p.timestamp);
        self.fx.insert(currency.trim().to_ascii_uppercase(), points);
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// The ticker under which the FX rate from `currency` to base is quoted.
    pub fn fx_pair(&self, currency: &str) -> String {
        format!("{}-{}", currency.to_ascii_uppercase(), self.base_currency)
    }

    pub fn currency_of(&self, ticker: &str) -> Option<&str> {
        self.currencies.get(ticker).map(String::as_str)
    }

    /// The base-currency price of `ticker` nearest to `date`.
    pub fn price_at(&self, ticker: &str, date: DateTime<Utc>) -> Result<Decimal, AnalyticsError> {
        let point = self
            .series
            .get(ticker)
            .and_then(|points| nearest(points, date))
            .ok_or_else(|| AnalyticsError::NoCachedSeries(ticker.to_string()))?;

        let currency = self.currency_of(ticker).unwrap_or(&self.base_currency);
        Ok(point.price * self.fx_rate_at(currency, date)?)
    }

    /// The `CCY-BASE` rate nearest to `date`; one for the base currency itself.
    pub fn fx_rate_at(
        &self,
        currency: &str,
        date: DateTime<Utc>,
    ) -> Result<Decimal, AnalyticsError> {
        if currency.eq_ignore_ascii_case(&self.base_currency) {
            return Ok(Decimal::ONE);
        }
        self.fx
            .get(&currency.to_ascii_uppercase())
            .and_then(|points| nearest(points, date))
            .map(|p| p.price)
            .ok_or_else(|| AnalyticsError::NoCachedSeries(self.fx_pair(currency)))
    }
}

/// The point closest to `date` in a timestamp-sorted series.
///
/// Ties go to the earlier point, and among equal timestamps to the first one,
/// so the answer matches a front-to-back linear scan for the minimum distance.
fn nearest(points: &[PricePoint], date: DateTime<Utc>) -> Option<&PricePoint> {
    if points.is_empty() {
        return None;
    }

    let after = points.partition_point(|p| p.timestamp < date);
    if after == 0 {
        return points.first();
    }

    let mut before = after - 1;
    while before > 0 && points[before - 1].timestamp == points[before].timestamp {
        before -= 1;
    }

    if after == points.len() {
        return Some(&points[before]);
    }

    let to_before = date - points[before].timestamp;
    let to_after = points[after].timestamp - date;
    if to_after < to_before {
        Some(&points[after])
    } else {
        Some(&points[before])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, instrument, point, MockBackend};
    use rust_decimal_macros::dec;

    fn cache() -> PriceCache {
        let mut cache = PriceCache::new("sgd");
        cache.insert_series(
            "LOCAL",
            "SGD",
            vec![
                point(date(2024, 1, 10), dec!(12), "SGD"),
                point(date(2024, 1, 1), dec!(10), "SGD"),
                point(date(2024, 1, 5), dec!(11), "SGD"),
            ],
        );
        cache.insert_series("US", "usd", vec![point(date(2024, 1, 1), dec!(100), "USD")]);
        cache.insert_fx(
            "USD",
            vec![
                point(date(2024, 1, 1), dec!(1.30), "SGD"),
                point(date(2024, 1, 20), dec!(1.40), "SGD"),
            ],
        );
        cache
    }

    #[test]
    fn test_exact_timestamp_returns_that_price() {
        let cache = cache();
        assert_eq!(cache.price_at("LOCAL", date(2024, 1, 5)).unwrap(), dec!(11));
        assert_eq!(cache.price_at("LOCAL", date(2024, 1, 10)).unwrap(), dec!(12));
    }

    #[test]
    fn test_nearest_point_and_out_of_range() {
        let cache = cache();
        assert_eq!(cache.price_at("LOCAL", date(2024, 1, 8)).unwrap(), dec!(12));
        assert_eq!(cache.price_at("LOCAL", date(2023, 6, 1)).unwrap(), dec!(10));
        assert_eq!(cache.price_at("LOCAL", date(2025, 1, 1)).unwrap(), dec!(12));
    }

    #[test]
    fn test_equidistant_resolves_to_earlier_point() {
        let cache = cache();
        // Jan 3 is two days from both Jan 1 and Jan 5.
        assert_eq!(cache.price_at("LOCAL", date(2024, 1, 3)).unwrap(), dec!(10));
    }

    #[test]
    fn test_duplicate_timestamps_take_first() {
        let points = vec![
            point(date(2024, 1, 1), dec!(1), "SGD"),
            point(date(2024, 1, 1), dec!(2), "SGD"),
            point(date(2024, 1, 9), dec!(3), "SGD"),
        ];
        assert_eq!(nearest(&points, date(2024, 1, 2)).unwrap().price, dec!(1));
        assert_eq!(nearest(&points, date(2024, 1, 1)).unwrap().price, dec!(1));
        assert!(nearest(&[], date(2024, 1, 1)).is_none());
    }

    #[test]
    fn test_foreign_price_is_converted() {
        let cache = cache();
        assert_eq!(cache.price_at("US", date(2024, 1, 2)).unwrap(), dec!(130.00));
        assert_eq!(cache.price_at("US", date(2024, 1, 19)).unwrap(), dec!(140.00));
        assert_eq!(cache.fx_rate_at("sgd", date(2024, 1, 2)).unwrap(), Decimal::ONE);
        assert_eq!(cache.currency_of("US"), Some("USD"));
    }

    #[test]
    fn test_unknown_ticker_or_pair() {
        let cache = cache();
        assert!(matches!(
            cache.price_at("NOPE", date(2024, 1, 1)),
            Err(AnalyticsError::NoCachedSeries(t)) if t == "NOPE"
        ));
        assert!(matches!(
            cache.fx_rate_at("EUR", date(2024, 1, 1)),
            Err(AnalyticsError::NoCachedSeries(p)) if p == "EUR-SGD"
        ));
    }

    fn basket() -> Vec<WeightedTicker> {
        vec![
            WeightedTicker::new("US", 0.5),
            WeightedTicker::new("LOCAL", 0.25),
            WeightedTicker::new("US", 0.25),
        ]
    }

    #[tokio::test]
    async fn test_build_loads_series_and_fx() {
        let mut backend = MockBackend::default();
        backend
            .series
            .insert("US".to_string(), vec![point(date(2024, 1, 1), dec!(100), "USD")]);
        backend
            .series
            .insert("LOCAL".to_string(), vec![point(date(2024, 1, 1), dec!(10), "SGD")]);
        backend
            .series
            .insert("USD-SGD".to_string(), vec![point(date(2023, 12, 28), dec!(1.3), "SGD")]);
        backend.instruments.insert("US".to_string(), instrument("USD"));

        let cache = PriceCache::build(
            &basket(),
            date(2024, 1, 1),
            date(2024, 1, 2),
            "SGD",
            5,
            &backend,
            &backend,
        )
        .await
        .unwrap();

        // LOCAL has no reference data and falls back to its series currency.
        assert_eq!(cache.currency_of("LOCAL"), Some("SGD"));
        assert_eq!(cache.price_at("US", date(2024, 1, 1)).unwrap(), dec!(130.0));
    }

    #[tokio::test]
    async fn test_build_fails_without_history() {
        let mut backend = MockBackend::default();
        backend
            .series
            .insert("US".to_string(), vec![point(date(2024, 1, 1), dec!(100), "USD")]);
        backend.instruments.insert("US".to_string(), instrument("USD"));

        let err = PriceCache::build(
            &basket(),
            date(2024, 1, 1),
            date(2024, 1, 2),
            "SGD",
            5,
            &backend,
            &backend,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::NoHistoricalData(t) if t == "LOCAL"));

        backend
            .series
            .insert("LOCAL".to_string(), vec![point(date(2024, 1, 1), dec!(10), "SGD")]);
        let err = PriceCache::build(
            &basket(),
            date(2024, 1, 1),
            date(2024, 1, 2),
            "SGD",
            5,
            &backend,
            &backend,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::NoHistoricalData(p) if p == "USD-SGD"));
    }

    #[tokio::test]
    async fn test_build_surfaces_upstream_failure() {
        let backend = MockBackend {
            fail_market: true,
            ..MockBackend::default()
        };
        let err = PriceCache::build(
            &basket(),
            date(2024, 1, 1),
            date(2024, 1, 2),
            "SGD",
            5,
            &backend,
            &backend,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::Upstream(_)));
    }
}
