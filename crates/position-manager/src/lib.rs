//! Position management for open equity positions.
//!
//! Rules are evaluated in a fixed order each cycle:
//! - target reached: sell at the target
//! - stop-loss hit: sell at the (possibly ratcheted) stop
//! - otherwise: ratchet the trailing stop upward when the live price allows

pub mod monitor;
pub mod stops;
pub mod targets;
pub mod trailing;
pub mod types;

pub use monitor::{evaluate, mirror, PositionMonitor};
pub use targets::exit_levels;
pub use types::{ExitLevels, MonitorAction, MonitorConfig, MonitorReport, PositionOutcome};
