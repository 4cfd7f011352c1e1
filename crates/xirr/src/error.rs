use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum XirrError {
    #[error("No rate exists: need at least two cash flows with both positive and negative amounts")]
    NoSolution,

    #[error("The solver did not converge on a rate")]
    DidNotConverge,
}
