use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of a benchmark comparison earned the higher IRR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Portfolio,
    Benchmark,
    Tie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    /// `portfolio_irr - benchmark_irr`.
    pub difference: Decimal,
    pub winner: Winner,
}

/// Diffs two IRRs. Only an exactly zero difference is a tie.
pub fn compare(portfolio_irr: Decimal, benchmark_irr: Decimal) -> Comparison {
    let difference = portfolio_irr - benchmark_irr;
    let winner = if difference > Decimal::ZERO {
        Winner::Portfolio
    } else if difference < Decimal::ZERO {
        Winner::Benchmark
    } else {
        Winner::Tie
    };
    Comparison { difference, winner }
}
