//! # Meridian Sources
//!
//! The collaborator interfaces the analytics engine reads from: the trade
//! ledger, current positions, dividend schedules, market data and instrument
//! reference data. The engine only ever talks to these traits, so any backend
//! (a database, a market-data service, an in-memory fixture) can be swapped in.
//!
//! ## Public API
//!
//! - `TradeSource`, `PositionSource`, `DividendSource`, `MarketDataSource`,
//!   `ReferenceSource`: the collaborator traits.
//! - `Sources`: a bundle of trait objects handed to the engine.
//! - `SnapshotStore`: a file-backed implementation of every trait.
//! - `SourceError`: the error type shared by all collaborators.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{DividendRecord, InstrumentInfo, Position, PricePoint, Trade};
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod error;
pub mod snapshot;

// --- Public API ---
pub use error::SourceError;
pub use snapshot::{Snapshot, SnapshotStore};

/// Dividend records grouped by ticker, in ticker order.
pub type DividendsByTicker = BTreeMap<String, Vec<DividendRecord>>;

/// The trade ledger.
#[async_trait]
pub trait TradeSource: Send + Sync {
    /// Returns every recorded trade in ledger order.
    async fn get_trades(&self) -> Vec<Trade>;
}

/// Current holdings.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn get_all_positions(&self) -> Result<Vec<Position>, SourceError>;
}

/// Dividend schedules and the portfolio's entitlement to them.
#[async_trait]
pub trait DividendSource: Send + Sync {
    /// Dividends the whole portfolio was entitled to, with `total_amount` filled in.
    async fn calculate_for_all_tickers(&self) -> Result<DividendsByTicker, SourceError>;

    /// Dividends a single book was entitled to, with `total_amount` filled in.
    async fn calculate_for_book(&self, book: &str) -> Result<DividendsByTicker, SourceError>;

    /// The raw per-share dividend schedule for a ticker, regardless of holdings.
    async fn dividend_history(&self, ticker: &str) -> Result<Vec<DividendRecord>, SourceError>;
}

/// Historical and spot prices. FX pairs are addressed as tickers, e.g. `USD-SGD`.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn get_historical_series(
        &self,
        ticker: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, SourceError>;

    async fn get_spot_price(&self, ticker: &str) -> Result<PricePoint, SourceError>;
}

/// Instrument reference data.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn get_instrument_info(&self, ticker: &str) -> Result<InstrumentInfo, SourceError>;
}

/// All collaborators the engine needs, as shared trait objects.
#[derive(Clone)]
pub struct Sources {
    pub trades: Arc<dyn TradeSource>,
    pub positions: Arc<dyn PositionSource>,
    pub dividends: Arc<dyn DividendSource>,
    pub market: Arc<dyn MarketDataSource>,
    pub reference: Arc<dyn ReferenceSource>,
}

impl Sources {
    /// Uses a single backend for every collaborator.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: TradeSource
            + PositionSource
            + DividendSource
            + MarketDataSource
            + ReferenceSource
            + 'static,
    {
        Self {
            trades: backend.clone(),
            positions: backend.clone(),
            dividends: backend.clone(),
            market: backend.clone(),
            reference: backend,
        }
    }
}
