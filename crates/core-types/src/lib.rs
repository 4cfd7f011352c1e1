pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{CashFlowKind, TradeSide};
pub use error::CoreError;
pub use structs::{
    matches_book, parse_timestamp, CashFlow, DividendRecord, InstrumentInfo, Position, PricePoint,
    Trade,
};
