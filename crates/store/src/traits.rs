//! Query contract between the reminder pipeline and the task datastore.

use taskping_core::{DueFilter, Task};

use crate::error::QueryError;

/// Read-only view of qualifying tasks.
///
/// Every method applies the same eligibility predicate
/// ([`taskping_core::qualifies`]): status is not `Done`, the assignee is
/// active, and the end date matches the [`DueFilter`]. Implementations must
/// keep the three methods consistent for the same data snapshot.
#[async_trait::async_trait]
pub trait TaskStore: Send + Sync {
    /// All qualifying tasks, ordered by ascending end timestamp, then task id.
    async fn tasks_due_within(&self, filter: &DueFilter) -> Result<Vec<Task>, QueryError>;

    /// Qualifying tasks assigned to one recipient, in the same order.
    async fn tasks_for_recipient(
        &self,
        email: &str,
        filter: &DueFilter,
    ) -> Result<Vec<Task>, QueryError>;

    /// Distinct assignee emails with at least one qualifying task, alphabetical.
    async fn recipients_due_within(&self, filter: &DueFilter) -> Result<Vec<String>, QueryError>;

    /// Short backend name for logs (e.g. `"postgres"`).
    fn backend_name(&self) -> &str;
}
