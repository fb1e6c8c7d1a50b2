//! Per-window schedule entry type.

use chrono::{DateTime, FixedOffset};
use cron::Schedule;
use taskping_core::ReminderWindow;

/// Scheduling state for one `(window, cron)` pair.
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub window: ReminderWindow,
    /// Expression as configured, for logs.
    pub expression: String,
    pub schedule: Schedule,
    /// Last tick at which this entry fired. Seeded with the start time so
    /// nothing fires retroactively.
    pub last_fired: Option<DateTime<FixedOffset>>,
}
