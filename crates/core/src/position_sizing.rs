use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Fixed-risk position sizer.
///
/// Risks `capital × risk_fraction` per trade, spread over the distance
/// between entry and stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskSizer {
    pub capital: Decimal,
    pub risk_fraction: Decimal,
}

impl RiskSizer {
    #[must_use]
    pub fn new(capital: Decimal, risk_fraction: Decimal) -> Self {
        Self {
            capital,
            risk_fraction,
        }
    }

    /// Whole shares to buy for a trade entered at `entry` with a stop at `stop`.
    ///
    /// # Arguments
    /// * `entry` - Entry price per share
    /// * `stop` - Stop-loss price per share
    ///
    /// # Returns
    /// `floor(capital × risk_fraction / (entry − stop))`, or 0 ("do not trade")
    /// when the stop is at or above the entry or the budget is not positive.
    #[must_use]
    pub fn size(&self, entry: Decimal, stop: Decimal) -> u32 {
        calculate_quantity(self.capital, self.risk_fraction, entry, stop)
    }
}

/// Free-function form of [`RiskSizer::size`].
#[must_use]
pub fn calculate_quantity(capital: Decimal, risk_fraction: Decimal, entry: Decimal, stop: Decimal) -> u32 {
    let per_share_risk = entry - stop;
    if per_share_risk <= Decimal::ZERO {
        return 0;
    }

    let risk_amount = capital * risk_fraction;
    if risk_amount <= Decimal::ZERO {
        return 0;
    }

    // Quantities past u32 are nonsensical for this account size
    (risk_amount / per_share_risk).floor().to_u32().unwrap_or(0)
}
