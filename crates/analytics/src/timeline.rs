use crate::error::AnalyticsError;
use core_types::CashFlow;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use xirr::{Flow, XirrError, XirrSolver};

/// Orders a timeline by date. Flows on the same date keep their insertion order.
pub fn sort_by_date(flows: &mut [CashFlow]) {
    flows.sort_by_key(|flow| flow.date);
}

/// Hands a cash-flow timeline to the solver and returns the rate as a Decimal.
pub fn solve_irr(solver: &XirrSolver, flows: &[CashFlow]) -> Result<Decimal, AnalyticsError> {
    let dated: Vec<Flow> = flows
        .iter()
        .map(|flow| Flow::new(flow.date.date_naive(), flow.amount.to_f64().unwrap_or(0.0)))
        .collect();

    rate_to_decimal(solver.solve(&dated)?)
}

/// A rate outside Decimal's range is a solver failure, not a bad request.
fn rate_to_decimal(rate: f64) -> Result<Decimal, AnalyticsError> {
    Decimal::from_f64(rate).ok_or_else(|| {
        tracing::warn!(rate, "Solved rate is outside the Decimal range.");
        AnalyticsError::Solver(XirrError::DidNotConverge)
    })
}

/// The negated sum of the buy and sell flows: the net capital put in.
pub fn net_capital(flows: &[CashFlow]) -> Decimal {
    -flows
        .iter()
        .filter(|flow| flow.is_trade())
        .map(|flow| flow.amount)
        .sum::<Decimal>()
}
