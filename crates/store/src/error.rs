//! Store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("datastore unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Database(#[from] sqlx::Error),
}
