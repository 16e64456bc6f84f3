//! Error types for querykit

use thiserror::Error;

/// Result type alias for querykit operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for query construction and execution
#[derive(Debug, Error)]
pub enum DbError {
    /// Malformed or missing builder/compiler input
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The underlying engine rejected or failed a statement.
    ///
    /// Carries the engine's literal message and code. Parameter keys (never
    /// values) are included for diagnosis.
    #[error("Query failed: {message}")]
    Query {
        message: String,
        code: Option<String>,
        param_keys: Vec<String>,
    },

    /// Write attempted on a connection flagged read-only.
    ///
    /// Raised before any SQL reaches the engine.
    #[error("Read-only connection: {0}")]
    ReadOnly(String),
}

impl DbError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a query-failure error without parameter context
    pub fn query(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Query {
            message: message.into(),
            code,
            param_keys: Vec::new(),
        }
    }

    /// Create a read-only violation error
    pub fn read_only(message: impl Into<String>) -> Self {
        Self::ReadOnly(message.into())
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a query-failure error
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }

    /// Check if this is a read-only violation
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly(_))
    }
}
