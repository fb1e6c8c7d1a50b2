//! Builders and fakes shared by the unit tests in this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use taskping_core::{FixedClock, Task, TaskStatus};
use taskping_notify::{MailTransport, Notification, NotifyError};

pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap()
}

/// 2026-03-10 09:00 at UTC.
pub fn clock() -> Arc<FixedClock> {
    let utc = FixedOffset::east_opt(0).unwrap();
    Arc::new(FixedClock(utc.from_local_datetime(&at(10, 9)).unwrap()))
}

pub fn task(id: &str, email: &str, end: NaiveDateTime) -> Task {
    Task {
        id: id.to_string(),
        title: format!("Task {id}"),
        description: String::new(),
        status: TaskStatus::Assigned,
        project_id: "p1".to_string(),
        start_date: None,
        end_date: Some(end),
        budget: 0.0,
        project_title: "Project".to_string(),
        assignee_name: email.split('@').next().unwrap_or_default().to_string(),
        assignee_email: email.to_string(),
        assignor_name: "System".to_string(),
    }
}

/// Records sent notifications; fails for one chosen recipient.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Notification>>,
    pub attempts: AtomicUsize,
    pub fail_for: Option<String>,
}

impl RecordingTransport {
    pub fn failing_for(email: &str) -> Self {
        Self {
            fail_for: Some(email.to_string()),
            ..Self::default()
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|n| n.to.clone()).collect()
    }
}

#[async_trait::async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_for.as_deref() == Some(notification.to.as_str()) {
            return Err(NotifyError::Smtp("550 mailbox unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }

    fn transport_name(&self) -> &str {
        "recording"
    }
}
