//! # Meridian Analytics Engine
//!
//! Money-weighted performance for a portfolio, or one book of it, and a
//! replayed benchmark to hold it up against.
//!
//! ## Architectural Principles
//!
//! - **Collaborators at the edge:** trades, positions, dividends and prices are
//!   read through the `sources` traits. Everything after the price cache is
//!   built runs as pure computation.
//! - **Stateless Calculation:** `MetricsBuilder` and `BenchmarkEngine` keep no
//!   state between calls. Price caches and synthetic positions live for a
//!   single comparison.
//!
//! ## Public API
//!
//! - `MetricsBuilder`: the real portfolio's cash-flow timeline and XIRR.
//! - `BenchmarkEngine`: validates a `BenchmarkRequest`, replays the basket and
//!   compares the two IRRs.
//! - `normalize`, `Cost`, `PriceCache`, `Replay`, `compare`: the building blocks.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod basket;
pub mod benchmark;
pub mod comparator;
pub mod error;
pub mod metrics;
pub mod position;
pub mod price_cache;
pub mod replay;
pub mod report;
pub mod settings;
pub mod timeline;

#[cfg(test)]
mod testing;

// Re-export the key components to create a clean, public-facing API.
pub use basket::{fee, leg_fee, normalize, Cost, WeightedTicker};
pub use benchmark::{BenchmarkEngine, BenchmarkRequest};
pub use comparator::{compare, Comparison, Winner};
pub use error::AnalyticsError;
pub use metrics::{MetricsBuilder, PORTFOLIO_TICKER};
pub use position::{PositionEvent, SyntheticPosition};
pub use price_cache::PriceCache;
pub use replay::{BenchmarkOutcome, Replay, ReplayMode, BENCHMARK_TICKER};
pub use report::{BenchmarkComparisonResult, BenchmarkResult, MetricsResult, PortfolioMetrics};
pub use settings::AnalyticsSettings;
