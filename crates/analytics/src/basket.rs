use crate::error::AnalyticsError;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One leg of a benchmark basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTicker {
    pub ticker: String,
    pub weight: f64,
}

impl WeightedTicker {
    pub fn new(ticker: impl Into<String>, weight: f64) -> Self {
        Self {
            ticker: ticker.into(),
            weight,
        }
    }

    /// The weight as a Decimal, for scaling money amounts.
    pub fn weight_decimal(&self) -> Decimal {
        to_decimal(self.weight)
    }
}

/// Transaction cost charged on every benchmark trade.
///
/// On the wire this is `{"pct": 0.001, "absolute": 5}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cost {
    #[serde(rename = "pct", default)]
    pub percentage: f64,
    #[serde(rename = "absolute", default)]
    pub absolute_floor: Decimal,
}

impl Cost {
    pub fn new(percentage: f64, absolute_floor: Decimal) -> Self {
        Self {
            percentage,
            absolute_floor,
        }
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if !self.percentage.is_finite() || self.percentage < 0.0 {
            return Err(AnalyticsError::InvalidInput(format!(
                "benchmark cost percentage must be a non-negative number, got {}",
                self.percentage
            )));
        }
        if self.absolute_floor.is_sign_negative() {
            return Err(AnalyticsError::InvalidInput(format!(
                "benchmark cost floor must not be negative, got {}",
                self.absolute_floor
            )));
        }
        Ok(())
    }

    /// The fee for a trade of the given notional: `max(pct * notional, floor)`.
    pub fn fee(&self, notional: Decimal) -> Decimal {
        (to_decimal(self.percentage) * notional).max(self.absolute_floor)
    }
}

/// Validates a basket and rescales its weights to sum to one.
///
/// Fails if any ticker is blank, any weight is not a positive finite number,
/// or the weights sum to zero. Input order is preserved. The sum is taken over
/// the weights in sorted order, so permuting the basket yields bit-identical
/// weights.
pub fn normalize(weights: &[WeightedTicker]) -> Result<Vec<WeightedTicker>, AnalyticsError> {
    for leg in weights {
        if leg.ticker.trim().is_empty() {
            return Err(AnalyticsError::InvalidInput(
                "benchmark ticker must not be empty".to_string(),
            ));
        }
        if !leg.weight.is_finite() || leg.weight <= 0.0 {
            return Err(AnalyticsError::InvalidInput(format!(
                "weight for {} must be a positive number, got {}",
                leg.ticker, leg.weight
            )));
        }
    }

    let mut sorted: Vec<f64> = weights.iter().map(|w| w.weight).collect();
    sorted.sort_by(f64::total_cmp);
    let total: f64 = sorted.iter().sum();
    if total <= 0.0 {
        return Err(AnalyticsError::InvalidInput(
            "benchmark weights sum to zero".to_string(),
        ));
    }

    Ok(weights
        .iter()
        .map(|leg| WeightedTicker::new(leg.ticker.trim(), leg.weight / total))
        .collect())
}

/// The fee for a trade of the given notional. See [`Cost::fee`].
pub fn fee(cost: &Cost, notional: Decimal) -> Decimal {
    cost.fee(notional)
}

/// A leg's share of a fee computed on the whole basket notional.
pub fn leg_fee(total_fee: Decimal, leg: &WeightedTicker) -> Decimal {
    total_fee * leg.weight_decimal()
}

pub(crate) fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}
