//! Cron normalization and due-check helpers.

use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use cron::Schedule;

/// Normalize a 5-field cron expression to 6-field by prepending "0 " for seconds.
///
/// The `cron` crate requires 6 fields: `sec min hour day-of-month month day-of-week`.
pub(crate) fn normalize_cron(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Normalize and parse a cron expression.
pub(crate) fn parse_cron(expression: &str) -> Result<Schedule, cron::error::Error> {
    Schedule::from_str(&normalize_cron(expression))
}

/// Check if a cron schedule is due at `now`.
///
/// Due when the first scheduled tick after `last_run` (exclusive) is at or
/// before `now`. Without a previous run the look-back is one day.
pub(crate) fn is_cron_due<Tz: TimeZone>(
    schedule: &Schedule,
    now: &DateTime<Tz>,
    last_run: Option<&DateTime<Tz>>,
) -> bool {
    let check_from = match last_run {
        Some(last) => last.clone(),
        None => now.clone() - chrono::Duration::days(1),
    };
    match schedule.after(&check_from).next() {
        Some(next) => next <= *now,
        None => false,
    }
}
