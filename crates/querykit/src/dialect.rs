//! SQL dialect identity and isolation levels.
//!
//! A [`Dialect`] is resolved once per connection and selects the identifier
//! [`Quoter`] and the [`QueryCompiler`]. It is immutable for the connection's
//! lifetime and never mixed within a single compiled statement.

use crate::compiler::QueryCompiler;
use crate::error::{DbError, DbResult};
use crate::quote::{QuoteStyle, Quoter};

/// Supported SQL dialects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    Postgres,
    MariaDb,
}

impl Dialect {
    /// Resolve a dialect from its string tag.
    ///
    /// Accepts the common aliases (`pgsql`, `mysql`) used by connection
    /// configuration.
    pub fn from_tag(tag: &str) -> DbResult<Self> {
        match tag {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "pgsql" => Ok(Dialect::Postgres),
            "mariadb" | "mysql" => Ok(Dialect::MariaDb),
            other => Err(DbError::configuration(format!("Unknown dialect tag: '{other}'"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
            Dialect::MariaDb => "mariadb",
        }
    }

    /// Identifier quoter for this dialect.
    pub fn quoter(&self) -> Quoter {
        match self {
            Dialect::MariaDb => Quoter::new(QuoteStyle::Backtick),
            Dialect::Sqlite | Dialect::Postgres => Quoter::new(QuoteStyle::Ansi),
        }
    }

    /// Query compiler for this dialect.
    ///
    /// The dialects share clause assembly; only the quoting style differs.
    pub fn compiler(&self) -> QueryCompiler {
        QueryCompiler::new(self.quoter())
    }
}

/// Transaction isolation levels.
///
/// Applied only to the outermost transaction; nested `begin` calls ignore it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// SQL keyword rendering used by `SET TRANSACTION ISOLATION LEVEL`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}
