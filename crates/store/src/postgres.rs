//! PostgreSQL implementation of [`TaskStore`] over the tracker schema.
//!
//! The schema is owned by the task tracker (`tasks`, `task_assignments`,
//! `users`, `projects`); this adapter only reads it. All window bounds and the
//! recipient address are bound parameters.

use std::str::FromStr;

use chrono::NaiveDateTime;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, warn};

use taskping_core::config::PostgresConfig;
use taskping_core::{DueFilter, Task, TaskDecodeError};

use crate::error::QueryError;
use crate::retry::{retry_linear, RetryPolicy};
use crate::traits::TaskStore;

const TASK_COLUMNS: &str = r#"SELECT
    tasks.id::text AS id,
    tasks.title,
    COALESCE(tasks.description, '') AS description,
    tasks.status::text AS status,
    tasks."projectId"::text AS project_id,
    tasks."startDate" AS start_date,
    tasks."endDate" AS end_date,
    COALESCE(tasks.budget, 0)::float8 AS budget,
    projects.title AS project_title,
    COALESCE(assignee.name, '') AS assignee_name,
    assignee.email AS assignee_email,
    COALESCE(creator.name, 'System') AS assignor_name"#;

/// Shared by every query so the task and recipient paths see the same rows.
const ASSIGNMENT_JOINS: &str = r#"
FROM task_assignments
JOIN users assignee ON task_assignments."userId" = assignee.id
JOIN tasks ON task_assignments."taskId" = tasks.id
JOIN projects ON tasks."projectId" = projects.id
LEFT JOIN users creator ON tasks."createdById" = creator.id"#;

// ── Row mapping ──────────────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: Option<String>,
    description: String,
    status: Option<String>,
    project_id: String,
    start_date: Option<NaiveDateTime>,
    end_date: Option<NaiveDateTime>,
    budget: f64,
    project_title: Option<String>,
    assignee_name: String,
    assignee_email: Option<String>,
    assignor_name: String,
}

fn required(value: Option<String>, column: &'static str) -> Result<String, TaskDecodeError> {
    value.ok_or(TaskDecodeError::MissingColumn(column))
}

impl TryFrom<TaskRow> for Task {
    type Error = TaskDecodeError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            status: required(row.status, "status")?.parse()?,
            title: required(row.title, "title")?,
            project_title: required(row.project_title, "project_title")?,
            assignee_email: required(row.assignee_email, "assignee_email")?,
            id: row.id,
            description: row.description,
            project_id: row.project_id,
            start_date: row.start_date,
            end_date: row.end_date,
            budget: row.budget,
            assignee_name: row.assignee_name,
            assignor_name: row.assignor_name,
        })
    }
}

/// Convert rows, logging and skipping any that do not map onto [`Task`].
fn decode_rows(rows: Vec<TaskRow>) -> Vec<Task> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            match Task::try_from(row) {
                Ok(task) => Some(task),
                Err(e) => {
                    warn!(task_id = %id, error = %e, "skipping undecodable task row");
                    None
                }
            }
        })
        .collect()
}

/// Drop NULL recipient addresses with a warning.
fn decode_emails(emails: Vec<Option<String>>) -> Vec<String> {
    emails
        .into_iter()
        .filter_map(|email| {
            if email.is_none() {
                warn!("skipping recipient row with NULL email");
            }
            email
        })
        .collect()
}

/// Append the eligibility predicate. Mirrors [`taskping_core::qualifies`].
fn push_eligibility(qb: &mut QueryBuilder<'_, Postgres>, filter: &DueFilter) {
    qb.push(
        " WHERE assignee.activated = true AND assignee.email IS NOT NULL \
         AND tasks.status::text <> 'Done' AND ",
    );
    match *filter {
        DueFilter::Between { from, to } => {
            qb.push(r#"tasks."endDate"::date BETWEEN "#)
                .push_bind(from)
                .push(" AND ")
                .push_bind(to);
        }
        DueFilter::Before(instant) => {
            qb.push(r#"tasks."endDate" < "#).push_bind(instant);
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────

/// Task store backed by a shared, long-lived connection pool.
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool with a single attempt.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, QueryError> {
        let ssl_mode = PgSslMode::from_str(&config.ssl_mode)
            .map_err(|e| QueryError::Unavailable(format!("invalid ssl mode: {e}")))?;

        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.username)
            .ssl_mode(ssl_mode);
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        info!(host = %config.host, db = %config.database, "PostgreSQL connected");
        Ok(Self::new(pool))
    }

    /// Open a pool, retrying with linearly increasing delay.
    ///
    /// Returns the last error once `connect_attempts` is exhausted; callers
    /// treat that as fatal.
    pub async fn connect_with_retry(config: &PostgresConfig) -> Result<Self, QueryError> {
        let policy = RetryPolicy {
            attempts: config.connect_attempts,
            step: config.connect_backoff(),
        };
        retry_linear(policy, "database connection", |_| Self::connect(config)).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_tasks(
        &self,
        filter: &DueFilter,
        email: Option<&str>,
    ) -> Result<Vec<Task>, QueryError> {
        let mut qb = QueryBuilder::<Postgres>::new(TASK_COLUMNS);
        qb.push(ASSIGNMENT_JOINS);
        push_eligibility(&mut qb, filter);
        if let Some(email) = email {
            qb.push(" AND assignee.email = ").push_bind(email.to_string());
        }
        qb.push(r#" ORDER BY tasks."endDate" ASC, tasks.id ASC"#);

        let rows = qb.build_query_as::<TaskRow>().fetch_all(&self.pool).await?;
        Ok(decode_rows(rows))
    }
}

#[async_trait::async_trait]
impl TaskStore for PgTaskStore {
    async fn tasks_due_within(&self, filter: &DueFilter) -> Result<Vec<Task>, QueryError> {
        self.fetch_tasks(filter, None).await
    }

    async fn tasks_for_recipient(
        &self,
        email: &str,
        filter: &DueFilter,
    ) -> Result<Vec<Task>, QueryError> {
        self.fetch_tasks(filter, Some(email)).await
    }

    async fn recipients_due_within(&self, filter: &DueFilter) -> Result<Vec<String>, QueryError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT DISTINCT assignee.email");
        qb.push(ASSIGNMENT_JOINS);
        push_eligibility(&mut qb, filter);
        qb.push(" ORDER BY assignee.email");

        let emails = qb
            .build_query_scalar::<Option<String>>()
            .fetch_all(&self.pool)
            .await?;
        Ok(decode_emails(emails))
    }

    fn backend_name(&self) -> &str {
        "postgres"
    }
}
