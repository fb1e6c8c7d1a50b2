//! Cron-driven reminder fires with one busy flag per window.
//!
//! Each configured `(window, cron)` pair becomes a [`ScheduleEntry`]. The
//! [`ScheduleCoordinator`] tick loop finds due entries and fires the pipeline
//! for their window on its own tokio task. A window that is still running
//! drops the new fire instead of queueing it. Different windows never block
//! each other.

mod core;
pub(crate) mod cron;
mod entry;
mod flags;


pub use self::core::{FireOutcome, ScheduleCoordinator};
pub use self::entry::ScheduleEntry;
