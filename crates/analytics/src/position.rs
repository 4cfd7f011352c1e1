use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A dated change in a synthetic holding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionEvent {
    pub date: DateTime<Utc>,
    pub quantity_delta: Decimal,
}

/// The running quantity of one benchmark ticker and the history that built it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyntheticPosition {
    quantity: Decimal,
    events: Vec<PositionEvent>,
}

impl SyntheticPosition {
    pub fn record(&mut self, date: DateTime<Utc>, quantity_delta: Decimal) {
        self.quantity += quantity_delta;
        self.events.push(PositionEvent {
            date,
            quantity_delta,
        });
    }

    /// Quantity held after every recorded event.
    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn events(&self) -> &[PositionEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn sort_events(&mut self) {
        self.events.sort_by_key(|e| e.date);
    }

    /// Quantity held at the end of `date`: the sum of every delta dated on or before it.
    pub fn quantity_as_of(&self, date: DateTime<Utc>) -> Decimal {
        self.events
            .iter()
            .filter(|e| e.date <= date)
            .map(|e| e.quantity_delta)
            .sum()
    }
}
