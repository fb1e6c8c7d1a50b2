//! End-to-end reminder runs against the in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use taskping_core::config::WorkspaceConfig;
use taskping_core::{FixedClock, ReminderWindow, Task, TaskStatus};
use taskping_notify::{Dispatcher, MailTransport, Notification, NotifyError};
use taskping_pipeline::{ReminderPipeline, RunReport};
use taskping_store::{AssignmentRow, MemoryTaskStore};

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<Notification>>,
    attempts: AtomicUsize,
    reject: Option<String>,
}

impl Outbox {
    fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MailTransport for Outbox {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.reject.as_deref() == Some(notification.to.as_str()) {
            return Err(NotifyError::Smtp("554 transaction failed".to_string()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }

    fn transport_name(&self) -> &str {
        "outbox"
    }
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap()
}

fn task(id: &str, email: &str, end: NaiveDateTime, status: TaskStatus) -> Task {
    Task {
        id: id.to_string(),
        title: format!("Task {id}"),
        description: String::new(),
        status,
        project_id: "p1".to_string(),
        start_date: None,
        end_date: Some(end),
        budget: 0.0,
        project_title: "Quarterly Close".to_string(),
        assignee_name: email.split('@').next().unwrap_or_default().to_string(),
        assignee_email: email.to_string(),
        assignor_name: "System".to_string(),
    }
}

/// Runs `window` at 2026-03-10 09:00 (UTC) over `rows`.
async fn run(rows: Vec<AssignmentRow>, outbox: Arc<Outbox>, window: &str) -> RunReport {
    let utc = FixedOffset::east_opt(0).unwrap();
    let clock = Arc::new(FixedClock(utc.from_local_datetime(&at(10, 9)).unwrap()));
    let dispatcher = Dispatcher::new(outbox, WorkspaceConfig::default());
    let pipeline = ReminderPipeline::new(Arc::new(MemoryTaskStore::new(rows)), dispatcher, clock);
    pipeline.run(window.parse::<ReminderWindow>().unwrap()).await
}

#[tokio::test]
async fn done_task_is_not_reminded() {
    let outbox = Arc::new(Outbox::default());
    let rows = vec![
        AssignmentRow::active(task("a1", "alice@example.com", at(11, 12), TaskStatus::Assigned)),
        AssignmentRow::active(task("b1", "bob@example.com", at(11, 12), TaskStatus::Done)),
    ];

    let report = run(rows, outbox.clone(), "1d").await;

    assert_eq!(report.delivered, 1);
    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.com");
    assert_eq!(sent[0].body.matches("📌 Task:").count(), 1);
}

#[tokio::test]
async fn two_due_tasks_make_one_message() {
    let outbox = Arc::new(Outbox::default());
    let rows = vec![
        AssignmentRow::active(task("a1", "alice@example.com", at(11, 10), TaskStatus::Assigned)),
        AssignmentRow::active(task("a2", "alice@example.com", at(11, 15), TaskStatus::InRecheck)),
    ];

    let report = run(rows, outbox.clone(), "1d").await;

    assert_eq!(report.groups, 1);
    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body.matches("📌 Task:").count(), 2);
    assert_eq!(sent[0].subject, "🔔 Task Notification: Task a1 – Quarterly Close");
}

#[tokio::test]
async fn rejected_recipient_does_not_block_others() {
    let outbox = Arc::new(Outbox {
        reject: Some("alice@example.com".to_string()),
        ..Outbox::default()
    });
    let rows = vec![
        AssignmentRow::active(task("a1", "alice@example.com", at(11, 10), TaskStatus::Assigned)),
        AssignmentRow::active(task("b1", "bob@example.com", at(11, 10), TaskStatus::Assigned)),
        AssignmentRow::active(task("c1", "carol@example.com", at(12, 10), TaskStatus::UnderReview)),
    ];

    let report = run(rows, outbox.clone(), "3d").await;

    assert_eq!(outbox.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.delivered, 2);
    let failed = report.outcomes.iter().find(|o| !o.success).unwrap();
    assert_eq!(failed.recipient, "alice@example.com");
    let to: Vec<String> = outbox.sent().into_iter().map(|n| n.to).collect();
    assert_eq!(to, vec!["bob@example.com", "carol@example.com"]);
}

#[tokio::test]
async fn done_tasks_are_excluded_for_every_horizon() {
    for window in ["1d", "2d", "3d", "overdue"] {
        let outbox = Arc::new(Outbox::default());
        let rows = vec![
            AssignmentRow::active(task("d1", "alice@example.com", at(9, 10), TaskStatus::Done)),
            AssignmentRow::active(task("d2", "alice@example.com", at(11, 10), TaskStatus::Done)),
            AssignmentRow::active(task("d3", "alice@example.com", at(13, 10), TaskStatus::Done)),
        ];

        let report = run(rows, outbox.clone(), window).await;

        assert_eq!(report.recipients, 0, "{window}");
        assert!(outbox.sent().is_empty(), "{window}");
    }
}

#[tokio::test]
async fn horizons_are_cumulative() {
    let rows = || {
        vec![AssignmentRow::active(task(
            "a1",
            "alice@example.com",
            at(11, 10),
            TaskStatus::Assigned,
        ))]
    };
    for window in ["1d", "2d", "3d"] {
        let outbox = Arc::new(Outbox::default());
        let report = run(rows(), outbox.clone(), window).await;
        assert_eq!(report.delivered, 1, "{window}");
    }
}

#[tokio::test]
async fn horizon_edge_is_inclusive() {
    let rows = || {
        vec![AssignmentRow::active(task(
            "edge",
            "alice@example.com",
            at(13, 23),
            TaskStatus::Assigned,
        ))]
    };

    let three = run(rows(), Arc::new(Outbox::default()), "3d").await;
    let two = run(rows(), Arc::new(Outbox::default()), "2d").await;

    assert_eq!(three.delivered, 1);
    assert_eq!(two.recipients, 0);
}

#[tokio::test]
async fn inactive_assignee_is_skipped() {
    let outbox = Arc::new(Outbox::default());
    let rows = vec![AssignmentRow::inactive(task(
        "a1",
        "alice@example.com",
        at(11, 10),
        TaskStatus::Assigned,
    ))];

    let report = run(rows, outbox.clone(), "1d").await;

    assert_eq!(report.recipients, 0);
    assert_eq!(outbox.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn description_reaches_recipient_verbatim() {
    let outbox = Arc::new(Outbox::default());
    let mut t = task("a1", "alice@example.com", at(11, 10), TaskStatus::Assigned);
    t.description = "<ul><li>reconcile <b>ledger</b></li></ul>".to_string();

    run(vec![AssignmentRow::active(t)], outbox.clone(), "1d").await;

    assert!(outbox.sent()[0].body.contains("<ul><li>reconcile <b>ledger</b></li></ul>"));
}
