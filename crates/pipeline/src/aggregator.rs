//! Groups qualifying tasks so each recipient gets exactly one message per run.

use std::collections::BTreeMap;

use taskping_core::{DueFilter, RecipientGroup, ReminderWindow, Task};
use taskping_store::TaskStore;
use tracing::{debug, warn};

/// One group per recipient, built from the recipient-scoped query.
///
/// Recipients whose query returns nothing are dropped. A failed query drops
/// only that recipient.
pub async fn aggregate_by_recipient(
    store: &dyn TaskStore,
    recipients: &[String],
    filter: &DueFilter,
    window: ReminderWindow,
) -> Vec<RecipientGroup> {
    let mut groups = Vec::with_capacity(recipients.len());
    for email in recipients {
        match store.tasks_for_recipient(email, filter).await {
            Ok(tasks) => match RecipientGroup::new(email.clone(), tasks) {
                Some(group) => groups.push(group),
                None => debug!(
                    window = %window,
                    recipient = %email,
                    "no qualifying tasks, skipping"
                ),
            },
            Err(e) => warn!(
                window = %window,
                recipient = %email,
                error = %e,
                "task query failed, skipping recipient"
            ),
        }
    }
    groups
}

/// Group an already fetched task list by assignee email.
///
/// Groups come out in email order; tasks keep their input order.
pub fn group_by_recipient(tasks: Vec<Task>) -> Vec<RecipientGroup> {
    let mut by_email: BTreeMap<String, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        by_email.entry(task.assignee_email.clone()).or_default().push(task);
    }
    by_email
        .into_iter()
        .filter_map(|(email, tasks)| RecipientGroup::new(email, tasks))
        .collect()
}
