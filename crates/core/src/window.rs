//! Due-date windows: which end dates a reminder run covers.
//!
//! A [`ReminderWindow`] is what gets scheduled (`3d`, `overdue`). At fire time
//! it is resolved against the current wall-clock time into a [`DueFilter`],
//! which is the concrete predicate every store adapter applies.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::task::Task;

/// Largest horizon accepted from configuration.
pub const MAX_HORIZON_DAYS: u32 = 365;

/// Number of days ahead of today a reminder run looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Horizon(u32);

impl Horizon {
    pub fn new(days: u32) -> Result<Self, ConfigError> {
        if days > MAX_HORIZON_DAYS {
            return Err(ConfigError::HorizonOutOfRange(days));
        }
        Ok(Self(days))
    }

    pub fn days(&self) -> u32 {
        self.0
    }

    /// Inclusive `[today, today + days]` date range.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let last = today
            .checked_add_days(Days::new(u64::from(self.0)))
            .unwrap_or(NaiveDate::MAX);
        (today, last)
    }
}

/// A schedulable reminder run kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderWindow {
    /// Tasks whose end date falls within the horizon.
    DueWithin(Horizon),
    /// Tasks whose end timestamp has already passed.
    Overdue,
}

impl ReminderWindow {
    pub fn horizon(days: u32) -> Result<Self, ConfigError> {
        Horizon::new(days).map(Self::DueWithin)
    }

    /// Resolve against the current wall-clock time.
    pub fn resolve(&self, now: NaiveDateTime) -> DueFilter {
        match self {
            Self::DueWithin(horizon) => {
                let (from, to) = horizon.date_range(now.date());
                DueFilter::Between { from, to }
            }
            Self::Overdue => DueFilter::Before(now),
        }
    }
}

impl fmt::Display for ReminderWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DueWithin(h) => write!(f, "{}-day", h.days()),
            Self::Overdue => f.write_str("overdue"),
        }
    }
}

impl FromStr for ReminderWindow {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("overdue") {
            return Ok(Self::Overdue);
        }
        let digits = trimmed.strip_suffix('d').unwrap_or(trimmed);
        let days: u32 = digits
            .parse()
            .map_err(|_| ConfigError::InvalidWindow(s.to_string()))?;
        Self::horizon(days)
    }
}

/// Concrete end-date predicate for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueFilter {
    /// End date (date part only) within `from..=to`.
    Between { from: NaiveDate, to: NaiveDate },
    /// End timestamp strictly before the instant.
    Before(NaiveDateTime),
}

impl DueFilter {
    pub fn matches(&self, end: Option<NaiveDateTime>) -> bool {
        let Some(end) = end else {
            return false;
        };
        match self {
            Self::Between { from, to } => {
                let date = end.date();
                *from <= date && date <= *to
            }
            Self::Before(instant) => end < *instant,
        }
    }
}

/// The single eligibility predicate shared by every store adapter.
pub fn qualifies(task: &Task, assignee_active: bool, filter: &DueFilter) -> bool {
    assignee_active && !task.status.is_done() && filter.matches(task.end_date)
}
