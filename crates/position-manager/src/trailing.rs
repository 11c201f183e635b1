//! Trailing stop ratchet. Stops only ever move up.

use rust_decimal::Decimal;

use crate::types::MonitorAction;

/// Trigger `trailing_pct` below the live price.
pub fn trailing_candidate(live: Decimal, trailing_pct: Decimal) -> Decimal {
    live * (Decimal::ONE - trailing_pct)
}

/// Raise the stop when the trailing candidate is above it.
pub fn check_trailing(live: Decimal, current_stop: Decimal, trailing_pct: Decimal) -> Option<MonitorAction> {
    let candidate = trailing_candidate(live, trailing_pct);
    (candidate > current_stop).then_some(MonitorAction::RaiseStop {
        from: current_stop,
        trigger: candidate,
    })
}

/// Effective stop given the entry-based stop and a previously ratcheted one.
pub fn effective_stop(base: Decimal, ratcheted: Option<Decimal>) -> Decimal {
    ratcheted.map_or(base, |r| r.max(base))
}
