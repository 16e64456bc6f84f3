//! The seam to the external relational engine.
//!
//! Everything below the [`Connection`](crate::Connection), from wire
//! protocol to statement preparation and result decoding, lives behind
//! [`Engine`]. The
//! engine receives SQL with named placeholders plus the normalized parameter
//! entries and returns plain rows; it knows nothing about builders,
//! transactions or dialect quoting. `pg.rs` provides the tokio-postgres
//! implementation; tests use a recording mock.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::value::Value;

/// One result row: column name → value.
pub type Row = BTreeMap<String, Value>;

/// A failure reported by the engine.
///
/// Carries the engine's literal message and, when available, its native
/// error code. The connection wraps this into the crate-level error taxonomy.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
    pub code: Option<String>,
}

impl EngineError {
    pub fn new(message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

/// A client for one relational engine.
///
/// Parameters arrive normalized: keys carry their leading `:` (positional
/// all-digit keys excepted) and temporal values are canonical strings.
/// Execution is the only blocking operation in this layer; it is
/// uninterruptible from here; callers rely on the engine's own timeouts.
pub trait Engine: Send + Sync {
    /// Run a statement and return every row.
    fn fetch_all(
        &self,
        sql: &str,
        params: &[(String, Value)],
    ) -> impl std::future::Future<Output = Result<Vec<Row>, EngineError>> + Send;

    /// Run a statement and return the first row, if any.
    fn fetch_one(
        &self,
        sql: &str,
        params: &[(String, Value)],
    ) -> impl std::future::Future<Output = Result<Option<Row>, EngineError>> + Send;

    /// Run a statement and return the affected row count.
    fn execute(
        &self,
        sql: &str,
        params: &[(String, Value)],
    ) -> impl std::future::Future<Output = Result<u64, EngineError>> + Send;

    /// Run a parameterless control statement (BEGIN, COMMIT, SAVEPOINT,
    /// PRAGMA, SET ...).
    fn exec(&self, sql: &str) -> impl std::future::Future<Output = Result<(), EngineError>> + Send;

    /// Identifier of the last inserted row.
    fn last_insert_id(
        &self,
    ) -> impl std::future::Future<Output = Result<String, EngineError>> + Send;
}
