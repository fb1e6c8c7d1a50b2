//! Distinct recipients with at least one qualifying task.

use std::collections::BTreeSet;

use taskping_core::DueFilter;
use taskping_store::{QueryError, TaskStore};

/// Alphabetical, duplicate-free recipient emails for `filter`.
///
/// The store already deduplicates; this pass guarantees it for any adapter
/// and drops blank addresses.
pub async fn resolve_recipients(
    store: &dyn TaskStore,
    filter: &DueFilter,
) -> Result<Vec<String>, QueryError> {
    let emails = store.recipients_due_within(filter).await?;
    let unique: BTreeSet<String> = emails
        .into_iter()
        .filter(|email| !email.trim().is_empty())
        .collect();
    Ok(unique.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use taskping_core::{ReminderWindow, Task};

    /// Returns a fixed, unsorted recipient list with duplicates.
    struct SloppyStore;

    #[async_trait::async_trait]
    impl TaskStore for SloppyStore {
        async fn tasks_due_within(&self, _: &DueFilter) -> Result<Vec<Task>, QueryError> {
            Ok(Vec::new())
        }

        async fn tasks_for_recipient(
            &self,
            _: &str,
            _: &DueFilter,
        ) -> Result<Vec<Task>, QueryError> {
            Ok(Vec::new())
        }

        async fn recipients_due_within(&self, _: &DueFilter) -> Result<Vec<String>, QueryError> {
            Ok(vec![
                "carol@example.com".to_string(),
                "alice@example.com".to_string(),
                "".to_string(),
                "carol@example.com".to_string(),
            ])
        }

        fn backend_name(&self) -> &str {
            "sloppy"
        }
    }

    fn filter() -> DueFilter {
        let now = NaiveDate::from_ymd_opt(2026, 3, 10)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap();
        ReminderWindow::horizon(1).unwrap().resolve(now)
    }

    #[tokio::test]
    async fn output_is_sorted_without_duplicates() {
        let emails = resolve_recipients(&SloppyStore, &filter()).await.unwrap();
        assert_eq!(emails, vec!["alice@example.com", "carol@example.com"]);
    }
}
