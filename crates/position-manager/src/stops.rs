//! Stop-loss rule.

use llm_trade_core::ExitReason;
use rust_decimal::Decimal;

use crate::types::MonitorAction;

/// Sell at the stop once the live price falls to it.
pub fn check_stop_loss(symbol: &str, live: Decimal, stop: Decimal) -> Option<MonitorAction> {
    if live <= stop {
        tracing::warn!(symbol, live = %live, stop = %stop, "Stop-loss triggered");
        return Some(MonitorAction::Exit {
            price: stop,
            reason: ExitReason::StopLossTriggered,
        });
    }
    None
}
