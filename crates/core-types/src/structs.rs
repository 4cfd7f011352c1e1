use crate::enums::{CashFlowKind, TradeSide};
use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A dated, signed amount of money tied to a ticker and the event that caused it.
///
/// Outflows (buys, benchmark allocations) are negative; inflows (sells,
/// dividends, the closing valuation) are positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: DateTime<Utc>,
    pub amount: Decimal,
    pub ticker: String,
    pub kind: CashFlowKind,
}

impl CashFlow {
    pub fn new(
        date: DateTime<Utc>,
        amount: Decimal,
        ticker: impl Into<String>,
        kind: CashFlowKind,
    ) -> Self {
        Self {
            date,
            amount,
            ticker: ticker.into(),
            kind,
        }
    }

    /// True for flows that represent capital moving in or out (buys and sells).
    pub fn is_trade(&self) -> bool {
        matches!(self.kind, CashFlowKind::Buy | CashFlowKind::Sell)
    }
}

/// A single executed trade as recorded by the ledger.
///
/// The trade date is kept as the raw ledger string; callers parse it with
/// [`Trade::parsed_date`] and decide what to do with records that don't parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub ticker: String,
    pub side: TradeSide,
    pub quantity: Decimal,
    pub price: Decimal,
    #[serde(default = "unit_rate")]
    pub fx_rate_to_base: Decimal,
    pub trade_date: String,
    #[serde(default)]
    pub book: String,
}

impl Trade {
    pub fn parsed_date(&self) -> Result<DateTime<Utc>, CoreError> {
        parse_timestamp(&self.trade_date)
    }

    /// Gross value of the trade in the base currency, unsigned by side.
    pub fn notional_in_base(&self) -> Decimal {
        self.quantity * self.price * self.fx_rate_to_base
    }
}

/// A snapshot of a current holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub quantity: Decimal,
    /// Market value in the instrument's own currency.
    pub market_value: Decimal,
    #[serde(default = "unit_rate")]
    pub fx_rate_to_base: Decimal,
    #[serde(default)]
    pub book: String,
}

impl Position {
    pub fn market_value_in_base(&self) -> Decimal {
        self.market_value * self.fx_rate_to_base
    }
}

/// A dividend event for one ticker.
///
/// `amount_per_share` is the gross per-share payout. `total_amount` is the gross
/// payout attributable to whatever holdings the producer calculated it for, and
/// is zero in a raw dividend schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendRecord {
    pub ticker: String,
    pub ex_date: DateTime<Utc>,
    pub amount_per_share: Decimal,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub withholding_tax_rate: Decimal,
}

impl DividendRecord {
    /// The fraction of a gross payout that survives withholding tax.
    pub fn net_factor(&self) -> Decimal {
        Decimal::ONE - self.withholding_tax_rate
    }
}

/// One observation of a price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub currency: String,
}

/// Reference data for a tradable instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentInfo {
    pub currency: String,
    #[serde(default)]
    pub domicile: String,
}

/// Decides whether a record booked under `book` falls inside `filter`.
///
/// An empty filter selects everything. Otherwise the comparison is an exact,
/// case-insensitive match, with unbooked records treated as `default_book`.
pub fn matches_book(book: &str, filter: &str, default_book: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    let effective = if book.trim().is_empty() { default_book } else { book };
    effective.eq_ignore_ascii_case(filter)
}

/// Parses the timestamp formats found in trade ledgers.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and plain
/// `YYYY-MM-DD` (taken as midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CoreError::InvalidInput("timestamp".to_string(), raw.to_string()))
}

fn unit_rate() -> Decimal {
    Decimal::ONE
}
