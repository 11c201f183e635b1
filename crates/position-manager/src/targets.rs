//! Profit target rule.

use llm_trade_core::ExitReason;
use rust_decimal::Decimal;

use crate::types::{ExitLevels, MonitorAction, MonitorConfig};

/// Target and stop for a position bought at `entry`.
pub fn exit_levels(entry: Decimal, config: &MonitorConfig) -> ExitLevels {
    ExitLevels {
        target: entry * (Decimal::ONE + config.target_pct),
        stop: entry * (Decimal::ONE - config.stop_loss_pct),
    }
}

/// Sell at the target once the live price reaches it.
pub fn check_target(symbol: &str, live: Decimal, target: Decimal) -> Option<MonitorAction> {
    if live >= target {
        tracing::info!(symbol, live = %live, target = %target, "Target reached");
        return Some(MonitorAction::Exit {
            price: target,
            reason: ExitReason::TargetReached,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn levels_from_entry() {
        let levels = exit_levels(dec!(100), &MonitorConfig::default());
        assert_eq!(levels.target, dec!(102.5));
        assert_eq!(levels.stop, dec!(98.5));
    }

    #[test]
    fn target_sells_at_target_not_live() {
        let action = check_target("RELIANCE.NS", dec!(103), dec!(102.5));
        assert_eq!(
            action,
            Some(MonitorAction::Exit {
                price: dec!(102.5),
                reason: ExitReason::TargetReached
            })
        );
    }

    #[test]
    fn exactly_at_target_sells() {
        assert!(check_target("RELIANCE.NS", dec!(102.5), dec!(102.5)).is_some());
        assert!(check_target("RELIANCE.NS", dec!(102.49), dec!(102.5)).is_none());
    }
}
