//! Wall-clock source for "now" and "today".

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Local wall-clock time with the offset dropped, as compared against task end dates.
    fn wall_time(&self) -> NaiveDateTime {
        self.now().naive_local()
    }
}

/// System time shifted into the configured offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn wall_time_uses_offset() {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        let instant = Utc.with_ymd_and_hms(2026, 3, 9, 20, 0, 0).unwrap();
        let clock = FixedClock(instant.with_timezone(&offset));
        assert_eq!(clock.wall_time().to_string(), "2026-03-10 03:00:00");
    }
}
