use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// The sign a cash flow carries for this side: buys pay out, sells take in.
    pub fn cash_sign(&self) -> i32 {
        match self {
            TradeSide::Buy => -1,
            TradeSide::Sell => 1,
        }
    }
}

/// The economic cause behind a cash flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowKind {
    Buy,
    Sell,
    Dividend,
    Valuation,
}

impl From<TradeSide> for CashFlowKind {
    fn from(side: TradeSide) -> Self {
        match side {
            TradeSide::Buy => CashFlowKind::Buy,
            TradeSide::Sell => CashFlowKind::Sell,
        }
    }
}
