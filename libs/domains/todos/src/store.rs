//! Persistence capability used by the [`TodoHandler`](crate::TodoHandler).
//!
//! A [`Store`] hands out one [`StoreConnection`] per call. The connection is
//! used for a single statement and returned to the backend when dropped,
//! whichever way the call ends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::context::CallContext;

/// Failure reported by a store. Only the handler turns these into
/// [`TodoError`](crate::TodoError)s.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No connection could be obtained.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The call's context was cancelled before the operation finished.
    #[error("operation cancelled")]
    Cancelled,

    #[error("query failed: {0}")]
    Query(String),

    /// A row came back in a shape that cannot be read.
    #[error("cannot decode row: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The statements the todo service issues. Rendered to SQL with bound
/// parameters by the store implementation.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Insert {
        title: String,
        description: String,
        reminder: DateTime<Utc>,
    },
    SelectById {
        id: i64,
    },
    SelectAll,
    Update {
        id: i64,
        title: String,
        description: String,
        reminder: DateTime<Utc>,
    },
    Delete {
        id: i64,
    },
}

/// Result of [`StoreConnection::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// Identifier assigned by an insert.
    pub last_insert_id: Option<i64>,
}

/// One stored todo as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub reminder: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Obtain a connection scoped to one call.
    async fn connect(&self, ctx: &CallContext) -> StoreResult<Box<dyn StoreConnection>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreConnection: Send {
    /// Run a statement that returns no rows.
    async fn execute(&mut self, ctx: &CallContext, statement: Statement) -> StoreResult<ExecOutcome>;

    /// Run a statement and collect its rows.
    async fn query(&mut self, ctx: &CallContext, statement: Statement) -> StoreResult<Vec<TodoRow>>;
}
