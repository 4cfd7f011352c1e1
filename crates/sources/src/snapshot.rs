use crate::error::SourceError;
use crate::{
    DividendSource, DividendsByTicker, MarketDataSource, PositionSource, ReferenceSource,
    TradeSource,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{
    matches_book, DividendRecord, InstrumentInfo, Position, PricePoint, Trade, TradeSide,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Everything a `SnapshotStore` serves, as stored on disk.
///
/// ```json
/// {
///   "trades": [{"ticker": "VWRA", "side": "buy", "quantity": 10, "price": 100,
///               "fx_rate_to_base": 1.35, "trade_date": "2023-01-03", "book": "Core"}],
///   "positions": [...],
///   "dividends": {"VWRA": [{"ticker": "VWRA", "ex_date": "...", "amount_per_share": 0.4}]},
///   "prices": {"VWRA": [...], "USD-SGD": [...]},
///   "instruments": {"VWRA": {"currency": "USD", "domicile": "IE"}}
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub trades: Vec<Trade>,
    #[serde(default)]
    pub positions: Vec<Position>,
    /// Raw per-share dividend schedules keyed by ticker.
    #[serde(default)]
    pub dividends: BTreeMap<String, Vec<DividendRecord>>,
    /// Price series keyed by ticker or FX pair.
    #[serde(default)]
    pub prices: BTreeMap<String, Vec<PricePoint>>,
    #[serde(default)]
    pub instruments: BTreeMap<String, InstrumentInfo>,
}

/// An in-memory collaborator backed by a JSON snapshot.
///
/// Dividend entitlements are derived from the snapshot's own trades: a record
/// pays `quantity held at the ex-date * amount_per_share`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    snapshot: Snapshot,
    default_book: String,
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot, default_book: impl Into<String>) -> Self {
        Self {
            snapshot,
            default_book: default_book.into(),
        }
    }

    /// Loads a snapshot from a JSON file.
    pub fn from_path(path: &Path, default_book: impl Into<String>) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            trades = snapshot.trades.len(),
            positions = snapshot.positions.len(),
            series = snapshot.prices.len(),
            "Loaded data snapshot."
        );
        Ok(Self::new(snapshot, default_book))
    }

    /// Quantity of `ticker` held at `as_of` by trades inside `book_filter`.
    fn quantity_held(&self, ticker: &str, as_of: DateTime<Utc>, book_filter: &str) -> Decimal {
        self.snapshot
            .trades
            .iter()
            .filter(|t| t.ticker == ticker)
            .filter(|t| matches_book(&t.book, book_filter, &self.default_book))
            .filter_map(|t| match t.parsed_date() {
                Ok(date) if date <= as_of => Some(t),
                _ => None,
            })
            .map(|t| match t.side {
                TradeSide::Buy => t.quantity,
                TradeSide::Sell => -t.quantity,
            })
            .sum()
    }

    fn entitlements(&self, book_filter: &str) -> DividendsByTicker {
        let mut out = DividendsByTicker::new();
        for (ticker, schedule) in &self.snapshot.dividends {
            let records: Vec<DividendRecord> = schedule
                .iter()
                .filter_map(|record| {
                    let held = self.quantity_held(ticker, record.ex_date, book_filter);
                    (held > Decimal::ZERO).then(|| DividendRecord {
                        total_amount: held * record.amount_per_share,
                        ..record.clone()
                    })
                })
                .collect();
            if !records.is_empty() {
                out.insert(ticker.clone(), records);
            }
        }
        out
    }
}

#[async_trait]
impl TradeSource for SnapshotStore {
    async fn get_trades(&self) -> Vec<Trade> {
        self.snapshot.trades.clone()
    }
}

#[async_trait]
impl PositionSource for SnapshotStore {
    async fn get_all_positions(&self) -> Result<Vec<Position>, SourceError> {
        Ok(self.snapshot.positions.clone())
    }
}

#[async_trait]
impl DividendSource for SnapshotStore {
    async fn calculate_for_all_tickers(&self) -> Result<DividendsByTicker, SourceError> {
        Ok(self.entitlements(""))
    }

    async fn calculate_for_book(&self, book: &str) -> Result<DividendsByTicker, SourceError> {
        Ok(self.entitlements(book))
    }

    async fn dividend_history(&self, ticker: &str) -> Result<Vec<DividendRecord>, SourceError> {
        Ok(self
            .snapshot
            .dividends
            .get(ticker)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl MarketDataSource for SnapshotStore {
    async fn get_historical_series(
        &self,
        ticker: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, SourceError> {
        Ok(self
            .snapshot
            .prices
            .get(ticker)
            .map(|series| {
                series
                    .iter()
                    .filter(|p| p.timestamp >= from && p.timestamp <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_spot_price(&self, ticker: &str) -> Result<PricePoint, SourceError> {
        self.snapshot
            .prices
            .get(ticker)
            .and_then(|series| series.iter().max_by_key(|p| p.timestamp))
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("spot price for {}", ticker)))
    }
}

#[async_trait]
impl ReferenceSource for SnapshotStore {
    async fn get_instrument_info(&self, ticker: &str) -> Result<InstrumentInfo, SourceError> {
        self.snapshot
            .instruments
            .get(ticker)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("instrument {}", ticker)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn trade(ticker: &str, side: TradeSide, qty: Decimal, date: &str, book: &str) -> Trade {
        Trade {
            ticker: ticker.to_string(),
            side,
            quantity: qty,
            price: dec!(10),
            fx_rate_to_base: Decimal::ONE,
            trade_date: date.to_string(),
            book: book.to_string(),
        }
    }

    fn point(date: DateTime<Utc>, price: Decimal) -> PricePoint {
        PricePoint {
            timestamp: date,
            price,
            currency: "USD".to_string(),
        }
    }

    fn store() -> SnapshotStore {
        let mut snapshot = Snapshot::default();
        snapshot.trades = vec![
            trade("AAA", TradeSide::Buy, dec!(100), "2023-01-10", "Growth"),
            trade("AAA", TradeSide::Buy, dec!(50), "2023-01-10", ""),
            trade("AAA", TradeSide::Sell, dec!(40), "2023-08-01", "Growth"),
            trade("AAA", TradeSide::Buy, dec!(999), "not a date", "Growth"),
        ];
        snapshot.dividends.insert(
            "AAA".to_string(),
            vec![
                DividendRecord {
                    ticker: "AAA".to_string(),
                    ex_date: at(2023, 1, 5),
                    amount_per_share: dec!(1),
                    total_amount: Decimal::ZERO,
                    withholding_tax_rate: Decimal::ZERO,
                },
                DividendRecord {
                    ticker: "AAA".to_string(),
                    ex_date: at(2023, 6, 1),
                    amount_per_share: dec!(0.5),
                    total_amount: Decimal::ZERO,
                    withholding_tax_rate: dec!(0.15),
                },
                DividendRecord {
                    ticker: "AAA".to_string(),
                    ex_date: at(2023, 9, 1),
                    amount_per_share: dec!(0.5),
                    total_amount: Decimal::ZERO,
                    withholding_tax_rate: dec!(0.15),
                },
            ],
        );
        snapshot.prices.insert(
            "AAA".to_string(),
            vec![
                point(at(2023, 1, 2), dec!(9)),
                point(at(2023, 6, 1), dec!(11)),
                point(at(2023, 12, 29), dec!(12)),
            ],
        );
        snapshot.instruments.insert(
            "AAA".to_string(),
            InstrumentInfo {
                currency: "USD".to_string(),
                domicile: "US".to_string(),
            },
        );
        SnapshotStore::new(snapshot, "Core")
    }

    #[tokio::test]
    async fn test_dividends_for_all_tickers_use_held_quantity() {
        let dividends = store().calculate_for_all_tickers().await.unwrap();
        let records = &dividends["AAA"];

        // The January record predates every trade and is dropped.
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].total_amount, dec!(75.0));
        assert_eq!(records[1].total_amount, dec!(55.0));
        assert_eq!(records[1].withholding_tax_rate, dec!(0.15));
    }

    #[tokio::test]
    async fn test_dividends_for_book_respect_default_book() {
        let store = store();

        let growth = store.calculate_for_book("growth").await.unwrap();
        assert_eq!(growth["AAA"][0].total_amount, dec!(50.0));
        assert_eq!(growth["AAA"][1].total_amount, dec!(30.0));

        let core = store.calculate_for_book("Core").await.unwrap();
        assert_eq!(core["AAA"][0].total_amount, dec!(25.0));

        assert!(store.calculate_for_book("Other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dividend_history_is_raw_schedule() {
        let store = store();
        assert_eq!(store.dividend_history("AAA").await.unwrap().len(), 3);
        assert!(store.dividend_history("ZZZ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_historical_series_window() {
        let store = store();
        let series = store
            .get_historical_series("AAA", at(2023, 1, 2), at(2023, 6, 1))
            .await
            .unwrap();
        assert_eq!(series.len(), 2);

        let missing = store
            .get_historical_series("ZZZ", at(2020, 1, 1), at(2030, 1, 1))
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_spot_price_is_latest_point() {
        let store = store();
        assert_eq!(store.get_spot_price("AAA").await.unwrap().price, dec!(12));
        assert!(matches!(
            store.get_spot_price("ZZZ").await,
            Err(SourceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_instrument_lookup() {
        let store = store();
        assert_eq!(store.get_instrument_info("AAA").await.unwrap().currency, "USD");
        assert!(store.get_instrument_info("ZZZ").await.is_err());
    }

    #[tokio::test]
    async fn test_from_path_round_trips_json() {
        let json = r#"{
            "trades": [{"ticker": "AAA", "side": "buy", "quantity": 1, "price": 10, "trade_date": "2023-01-10"}],
            "instruments": {"AAA": {"currency": "usd"}}
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let store = SnapshotStore::from_path(file.path(), "Core").unwrap();
        assert_eq!(store.get_trades().await.len(), 1);
        assert!(store.get_all_positions().await.unwrap().is_empty());
        assert_eq!(store.get_instrument_info("AAA").await.unwrap().domicile, "");
    }

    #[test]
    fn test_from_path_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(matches!(
            SnapshotStore::from_path(file.path(), "Core"),
            Err(SourceError::Deserialization(_))
        ));
    }
}
