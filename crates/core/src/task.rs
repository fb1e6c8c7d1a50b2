//! Task snapshot and recipient grouping types.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::TaskDecodeError;

/// Workflow status of a task as stored in the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Assigned,
    UnderReview,
    InRecheck,
    Done,
    Unassigned,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        Self::Assigned,
        Self::UnderReview,
        Self::InRecheck,
        Self::Done,
        Self::Unassigned,
    ];

    /// Label as stored in the datastore.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "Assigned",
            Self::UnderReview => "UnderReview",
            Self::InRecheck => "InRecheck",
            Self::Done => "Done",
            Self::Unassigned => "Unassigned",
        }
    }

    /// CSS class used for the status badge (`underreview`, `done`, ...).
    pub fn badge_class(&self) -> String {
        self.as_str().to_lowercase()
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TaskDecodeError::UnknownStatus(s.to_string()))
    }
}

/// Read-only snapshot of one task assignment, fetched per pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub project_id: String,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub budget: f64,
    pub project_title: String,
    pub assignee_name: String,
    pub assignee_email: String,
    pub assignor_name: String,
}

/// One recipient together with every task they should be reminded about in a run.
///
/// Construction goes through [`RecipientGroup::new`], which refuses an empty
/// task list, so a group in hand always has at least one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipientGroup {
    recipient: String,
    tasks: Vec<Task>,
}

impl RecipientGroup {
    /// Returns `None` when `tasks` is empty.
    pub fn new(recipient: impl Into<String>, tasks: Vec<Task>) -> Option<Self> {
        if tasks.is_empty() {
            return None;
        }
        Some(Self {
            recipient: recipient.into(),
            tasks,
        })
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The task listed first, used for the message subject.
    pub fn lead_task(&self) -> &Task {
        &self.tasks[0]
    }
}
