//! In-memory collaborators for unit tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use core_types::{DividendRecord, InstrumentInfo, Position, PricePoint, Trade};
use rust_decimal::Decimal;
use sources::{
    DividendSource, DividendsByTicker, MarketDataSource, PositionSource, ReferenceSource,
    SourceError, Sources, TradeSource,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn instrument(currency: &str) -> InstrumentInfo {
    InstrumentInfo {
        currency: currency.to_string(),
        domicile: String::new(),
    }
}

pub fn point(on: DateTime<Utc>, price: Decimal, currency: &str) -> PricePoint {
    PricePoint {
        timestamp: on,
        price,
        currency: currency.to_string(),
    }
}

#[derive(Default)]
pub struct MockBackend {
    pub trades: Vec<Trade>,
    pub positions: Vec<Position>,
    /// Entitlements keyed by book; the empty key answers the unfiltered call.
    pub entitlements: BTreeMap<String, DividendsByTicker>,
    pub history: BTreeMap<String, Vec<DividendRecord>>,
    pub series: BTreeMap<String, Vec<PricePoint>>,
    pub spots: BTreeMap<String, PricePoint>,
    pub instruments: BTreeMap<String, InstrumentInfo>,
    pub fail_positions: bool,
    pub fail_market: bool,
    pub fail_dividends: bool,
}

impl MockBackend {
    pub fn into_sources(self) -> Sources {
        Sources::from_backend(Arc::new(self))
    }
}

#[async_trait]
impl TradeSource for MockBackend {
    async fn get_trades(&self) -> Vec<Trade> {
        self.trades.clone()
    }
}

#[async_trait]
impl PositionSource for MockBackend {
    async fn get_all_positions(&self) -> Result<Vec<Position>, SourceError> {
        if self.fail_positions {
            return Err(SourceError::Upstream("positions offline".to_string()));
        }
        Ok(self.positions.clone())
    }
}

impl MockBackend {
    fn dividends_online(&self) -> Result<(), SourceError> {
        if self.fail_dividends {
            return Err(SourceError::Upstream("dividends offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DividendSource for MockBackend {
    async fn calculate_for_all_tickers(&self) -> Result<DividendsByTicker, SourceError> {
        self.dividends_online()?;
        Ok(self.entitlements.get("").cloned().unwrap_or_default())
    }

    async fn calculate_for_book(&self, book: &str) -> Result<DividendsByTicker, SourceError> {
        self.dividends_online()?;
        Ok(self.entitlements.get(book).cloned().unwrap_or_default())
    }

    async fn dividend_history(&self, ticker: &str) -> Result<Vec<DividendRecord>, SourceError> {
        self.dividends_online()?;
        Ok(self.history.get(ticker).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl MarketDataSource for MockBackend {
    async fn get_historical_series(
        &self,
        ticker: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, SourceError> {
        if self.fail_market {
            return Err(SourceError::Upstream("market data offline".to_string()));
        }
        Ok(self
            .series
            .get(ticker)
            .map(|s| {
                s.iter()
                    .filter(|p| p.timestamp >= from && p.timestamp <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_spot_price(&self, ticker: &str) -> Result<PricePoint, SourceError> {
        self.spots
            .get(ticker)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))
    }
}

#[async_trait]
impl ReferenceSource for MockBackend {
    async fn get_instrument_info(&self, ticker: &str) -> Result<InstrumentInfo, SourceError> {
        self.instruments
            .get(ticker)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))
    }
}
