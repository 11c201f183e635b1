//! Scheduling for the trading daemon.
//!
//! [`TradingJobs`] holds the wired collaborators and runs one trade or
//! monitor job on demand; [`TradingScheduler`] fires those jobs on cron
//! schedules until the process is interrupted.

pub mod jobs;
pub mod scheduler;

pub use jobs::TradingJobs;
pub use scheduler::TradingScheduler;
