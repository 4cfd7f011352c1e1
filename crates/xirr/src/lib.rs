//! # XIRR Solver
//!
//! Computes the extended internal rate of return: the annualized rate that
//! discounts an irregular series of dated cash flows to a net present value of
//! zero.
//!
//! The crate knows nothing about portfolios. Anything exposing a date and an
//! amount through [`DatedAmount`] can be solved.
//!
//! ## Public API
//!
//! - `XirrSolver`: configurable solver (tolerance, iteration cap).
//! - `solve`: solve with default settings.
//! - `npv`: net present value of a timeline at a given rate.
//! - `XirrError`: `NoSolution` for degenerate input, `DidNotConverge` otherwise.

pub mod error;
pub mod solver;

pub use error::XirrError;
pub use solver::{npv, solve, DatedAmount, Flow, XirrSolver};
