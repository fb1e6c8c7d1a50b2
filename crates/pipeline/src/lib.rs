//! Reminder pipeline: resolve recipients, aggregate their due tasks, dispatch.
//!
//! This crate provides:
//! - `resolve_recipients`, the distinct recipients for one due filter
//! - `aggregate_by_recipient` / `group_by_recipient`, one group per recipient
//! - `ReminderPipeline`, one end-to-end run for one reminder window
//! - `ScheduleCoordinator`, cron-driven fires with a per-window busy flag

pub mod aggregator;
pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use aggregator::{aggregate_by_recipient, group_by_recipient};
pub use error::ScheduleError;
pub use pipeline::{ReminderPipeline, RunReport};
pub use resolver::resolve_recipients;
pub use scheduler::{FireOutcome, ScheduleCoordinator};
