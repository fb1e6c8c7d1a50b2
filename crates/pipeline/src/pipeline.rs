//! One reminder run: resolve, aggregate, dispatch.

use std::sync::Arc;
use std::time::Instant;

use taskping_core::{Clock, ReminderWindow};
use taskping_notify::{DeliveryOutcome, Dispatcher};
use taskping_store::TaskStore;
use tracing::{info, warn};

use crate::aggregator::aggregate_by_recipient;
use crate::resolver::resolve_recipients;

/// Summary of a single run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub window: ReminderWindow,
    /// Distinct recipients resolved for the window.
    pub recipients: usize,
    /// Non-empty groups handed to the dispatcher.
    pub groups: usize,
    pub delivered: usize,
    pub failed: usize,
    /// The recipient query failed and nothing was dispatched.
    pub query_failed: bool,
    pub outcomes: Vec<DeliveryOutcome>,
}

impl RunReport {
    fn empty(window: ReminderWindow) -> Self {
        Self {
            window,
            recipients: 0,
            groups: 0,
            delivered: 0,
            failed: 0,
            query_failed: false,
            outcomes: Vec::new(),
        }
    }
}

/// Owns the store handle, dispatcher and clock for every scheduled run.
pub struct ReminderPipeline {
    store: Arc<dyn TaskStore>,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
}

impl ReminderPipeline {
    pub fn new(store: Arc<dyn TaskStore>, dispatcher: Dispatcher, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            dispatcher,
            clock,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Run the pipeline once for `window`.
    ///
    /// A failed recipient query is logged and yields an empty report. Delivery
    /// failures are counted per recipient and never abort the run.
    pub async fn run(&self, window: ReminderWindow) -> RunReport {
        let start = Instant::now();
        let filter = window.resolve(self.clock.wall_time());
        info!(
            window = %window,
            store = self.store.backend_name(),
            ?filter,
            "reminder run started"
        );

        let recipients = match resolve_recipients(self.store.as_ref(), &filter).await {
            Ok(recipients) => recipients,
            Err(e) => {
                warn!(window = %window, error = %e, "recipient query failed, skipping run");
                return RunReport {
                    query_failed: true,
                    ..RunReport::empty(window)
                };
            }
        };

        if recipients.is_empty() {
            info!(window = %window, "no recipients with due tasks");
            return RunReport::empty(window);
        }

        let groups =
            aggregate_by_recipient(self.store.as_ref(), &recipients, &filter, window).await;
        let outcomes = self.dispatcher.dispatch_all(&groups, window).await;
        let delivered = outcomes.iter().filter(|o| o.is_success()).count();

        let report = RunReport {
            window,
            recipients: recipients.len(),
            groups: groups.len(),
            delivered,
            failed: outcomes.len() - delivered,
            query_failed: false,
            outcomes,
        };

        info!(
            window = %window,
            recipients = report.recipients,
            groups = report.groups,
            delivered = report.delivered,
            failed = report.failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "reminder run finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, clock, task, RecordingTransport};
    use std::sync::atomic::Ordering;
    use taskping_core::config::WorkspaceConfig;
    use taskping_store::{AssignmentRow, MemoryTaskStore};

    fn pipeline(
        store: Arc<MemoryTaskStore>,
        transport: Arc<RecordingTransport>,
    ) -> ReminderPipeline {
        let dispatcher = Dispatcher::new(transport, WorkspaceConfig::default());
        ReminderPipeline::new(store, dispatcher, clock())
    }

    fn one_day() -> ReminderWindow {
        ReminderWindow::horizon(1).unwrap()
    }

    #[tokio::test]
    async fn run_dispatches_one_message_per_recipient() {
        let store = Arc::new(MemoryTaskStore::new(vec![
            AssignmentRow::active(task("a1", "alice@example.com", at(11, 9))),
            AssignmentRow::active(task("a2", "alice@example.com", at(10, 17))),
            AssignmentRow::active(task("b1", "bob@example.com", at(11, 12))),
        ]));
        let transport = Arc::new(RecordingTransport::default());

        let report = pipeline(store, transport.clone()).run(one_day()).await;

        assert_eq!(report.recipients, 2);
        assert_eq!(report.groups, 2);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(transport.recipients(), vec!["alice@example.com", "bob@example.com"]);
    }

    #[tokio::test]
    async fn no_recipients_short_circuits() {
        let store = Arc::new(MemoryTaskStore::new(vec![AssignmentRow::active(task(
            "far",
            "alice@example.com",
            at(20, 9),
        ))]));
        let transport = Arc::new(RecordingTransport::default());

        let report = pipeline(store.clone(), transport.clone()).run(one_day()).await;

        assert_eq!(report.recipients, 0);
        assert!(!report.query_failed);
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 0);
        // Only the recipient query ran.
        assert_eq!(store.query_count(), 1);
    }

    #[tokio::test]
    async fn query_failure_yields_empty_report() {
        let store = Arc::new(MemoryTaskStore::new(vec![AssignmentRow::active(task(
            "a1",
            "alice@example.com",
            at(11, 9),
        ))]));
        store.set_unavailable(true);
        let transport = Arc::new(RecordingTransport::default());

        let report = pipeline(store, transport.clone()).run(one_day()).await;

        assert!(report.query_failed);
        assert_eq!(report.groups, 0);
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn delivery_failure_is_counted_not_fatal() {
        let store = Arc::new(MemoryTaskStore::new(vec![
            AssignmentRow::active(task("a1", "alice@example.com", at(11, 9))),
            AssignmentRow::active(task("b1", "bob@example.com", at(11, 9))),
        ]));
        let transport = Arc::new(RecordingTransport::failing_for("alice@example.com"));

        let report = pipeline(store, transport.clone()).run(one_day()).await;

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(transport.recipients(), vec!["bob@example.com"]);
    }

    #[tokio::test]
    async fn overdue_window_picks_past_tasks() {
        let store = Arc::new(MemoryTaskStore::new(vec![
            AssignmentRow::active(task("old", "alice@example.com", at(9, 17))),
            AssignmentRow::active(task("soon", "bob@example.com", at(10, 17))),
        ]));
        let transport = Arc::new(RecordingTransport::default());

        let report = pipeline(store, transport.clone()).run(ReminderWindow::Overdue).await;

        assert_eq!(report.delivered, 1);
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].to, "alice@example.com");
        assert!(sent[0].subject.starts_with("⚠️ Overdue Task:"));
    }
}
