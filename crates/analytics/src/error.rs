use sources::SourceError;
use thiserror::Error;
use xirr::XirrError;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported benchmark mode '{0}': expected 'buy_at_start' or 'match_trades'")]
    UnsupportedMode(String),

    #[error("No trades available to benchmark against")]
    NoTradesAvailable,

    #[error("Upstream data source failed: {0}")]
    Upstream(#[from] SourceError),

    #[error("IRR calculation failed: {0}")]
    Solver(#[from] XirrError),

    #[error("No historical data available for {0}")]
    NoHistoricalData(String),

    #[error("No cached price series for {0}")]
    NoCachedSeries(String),
}

impl AnalyticsError {
    /// True when the caller's request was at fault rather than the data or the engine.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalyticsError::InvalidInput(_) | AnalyticsError::UnsupportedMode(_)
        )
    }
}
