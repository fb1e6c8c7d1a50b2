//! In-process task store.
//!
//! Holds assignment rows in memory and applies the same eligibility predicate
//! as the SQL adapter. Used by tests and for local runs without a database.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use taskping_core::{qualifies, DueFilter, Task};

use crate::error::QueryError;
use crate::traits::TaskStore;

/// One task assignment together with the assignee's activation flag.
#[derive(Debug, Clone)]
pub struct AssignmentRow {
    pub task: Task,
    pub assignee_active: bool,
}

impl AssignmentRow {
    pub fn active(task: Task) -> Self {
        Self {
            task,
            assignee_active: true,
        }
    }

    pub fn inactive(task: Task) -> Self {
        Self {
            task,
            assignee_active: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    rows: RwLock<Vec<AssignmentRow>>,
    unavailable: AtomicBool,
    queries: AtomicUsize,
}

impl MemoryTaskStore {
    pub fn new(rows: Vec<AssignmentRow>) -> Self {
        Self {
            rows: RwLock::new(rows),
            ..Self::default()
        }
    }

    pub fn insert(&self, row: AssignmentRow) {
        if let Ok(mut rows) = self.rows.write() {
            rows.push(row);
        }
    }

    /// Make every subsequent query fail with [`QueryError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of queries answered or refused so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn select(&self, filter: &DueFilter, email: Option<&str>) -> Result<Vec<Task>, QueryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueryError::Unavailable("memory store marked unavailable".to_string()));
        }

        let rows = self
            .rows
            .read()
            .map_err(|e| QueryError::Unavailable(format!("rows lock poisoned: {e}")))?;

        let mut tasks: Vec<Task> = rows
            .iter()
            .filter(|row| email.map_or(true, |e| row.task.assignee_email == e))
            .filter(|row| qualifies(&row.task, row.assignee_active, filter))
            .map(|row| row.task.clone())
            .collect();

        tasks.sort_by(|a, b| a.end_date.cmp(&b.end_date).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }
}

#[async_trait::async_trait]
impl TaskStore for MemoryTaskStore {
    async fn tasks_due_within(&self, filter: &DueFilter) -> Result<Vec<Task>, QueryError> {
        self.select(filter, None)
    }

    async fn tasks_for_recipient(
        &self,
        email: &str,
        filter: &DueFilter,
    ) -> Result<Vec<Task>, QueryError> {
        self.select(filter, Some(email))
    }

    async fn recipients_due_within(&self, filter: &DueFilter) -> Result<Vec<String>, QueryError> {
        let emails: BTreeSet<String> = self
            .select(filter, None)?
            .into_iter()
            .map(|task| task.assignee_email)
            .collect();
        Ok(emails.into_iter().collect())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
