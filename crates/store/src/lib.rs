//! Read-only access to tasks, assignments, projects and users.
//!
//! This crate provides:
//! - `TaskStore` trait, the query contract the reminder pipeline depends on
//! - `PgTaskStore`, the PostgreSQL implementation over the tracker schema
//! - `MemoryTaskStore`, an in-process implementation for tests and local runs
//! - `connect_with_retry` for bounded, linearly backed-off pool acquisition

pub mod error;
pub mod memory;
pub mod postgres;
pub mod retry;
pub mod traits;

pub use error::QueryError;
pub use memory::{AssignmentRow, MemoryTaskStore};
pub use postgres::PgTaskStore;
pub use retry::{retry_linear, RetryPolicy};
pub use traits::TaskStore;
