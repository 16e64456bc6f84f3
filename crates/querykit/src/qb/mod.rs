//! Fluent query builders.
//!
//! A builder is a mutable, single-use accumulator of query intent for one
//! statement kind. Builders are created through a [`QueryFactory`] (usually
//! via `Connection::query()`), mutated through their own fluent methods,
//! consumed once by `compile()` or an execution method, then discarded. They
//! are cheap and never shared across threads.
//!
//! # Usage
//!
//! ```ignore
//! use querykit::{params, Dialect, QueryFactory};
//!
//! let query = QueryFactory::new(Dialect::Postgres);
//!
//! let compiled = query
//!     .select(&["id", "name"])
//!     .from("users")
//!     .and_where("age > :age", params! { "age" => 30 })
//!     .or_where_group(|q| {
//!         q.and_where("phone = :phone", params! { "phone" => "+111" })
//!             .or_where("email = :email", params! { "email" => "a@b.c" })
//!     })
//!     .order_by_desc("created_at")
//!     .limit(20)
//!     .compile();
//! ```

pub(crate) mod clauses;
pub mod delete;
pub mod insert;
pub mod select;
pub mod subquery;
pub mod update;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::{OrderBy, OrderDir, Page, SelectBuilder};
pub use subquery::Subquery;
pub use update::UpdateBuilder;

use crate::compiler::QueryCompiler;
use crate::dialect::Dialect;
use crate::quote::Quoter;
use crate::value::Value;

/// Shared builder state: the dialect and table prefix, captured once from the
/// connection and carried by every builder and subquery it spawns.
#[derive(Clone, Debug)]
pub struct BuilderContext {
    dialect: Dialect,
    prefix: String,
}

impl BuilderContext {
    pub fn new(dialect: Dialect, prefix: impl Into<String>) -> Self {
        Self {
            dialect,
            prefix: prefix.into(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn quoter(&self) -> Quoter {
        self.dialect.quoter()
    }

    pub fn compiler(&self) -> QueryCompiler {
        self.dialect.compiler()
    }

    /// Prepend the connection's table prefix to a bare table name.
    pub fn apply_prefix(&self, table: &str) -> String {
        format!("{}{}", self.prefix, table.trim())
    }
}

/// Creates query builders bound to one dialect and table prefix.
#[derive(Clone, Debug)]
pub struct QueryFactory {
    ctx: BuilderContext,
}

impl QueryFactory {
    /// Create a factory without a table prefix.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            ctx: BuilderContext::new(dialect, ""),
        }
    }

    /// Create a factory with a table prefix applied to every named table.
    pub fn with_prefix(dialect: Dialect, prefix: impl Into<String>) -> Self {
        Self {
            ctx: BuilderContext::new(dialect, prefix),
        }
    }

    pub(crate) fn from_context(ctx: BuilderContext) -> Self {
        Self { ctx }
    }

    /// Create a SELECT builder with the given projection (`&[]` for `*`).
    pub fn select(&self, columns: &[&str]) -> SelectBuilder {
        SelectBuilder::new(self.ctx.clone(), columns)
    }

    /// Create an INSERT builder for the given table.
    pub fn insert(&self, table: &str) -> InsertBuilder {
        InsertBuilder::new(self.ctx.clone(), table)
    }

    /// Create an UPDATE builder for the given table.
    pub fn update(&self, table: &str) -> UpdateBuilder {
        UpdateBuilder::new(self.ctx.clone(), table)
    }

    /// Create a DELETE builder for the given table.
    pub fn delete(&self, table: &str) -> DeleteBuilder {
        DeleteBuilder::new(self.ctx.clone(), table)
    }
}

/// Split `"name alias"` on whitespace, apply the prefix to the name part and
/// re-join. Raw expressions never go through here.
pub(crate) fn prefix_table_spec(ctx: &BuilderContext, table: &str) -> String {
    let mut parts = table.split_whitespace();
    let name = parts.next().unwrap_or("");
    let alias = parts.next();

    let name = ctx.apply_prefix(name);
    match alias {
        Some(alias) => format!("{name} {alias}"),
        None => name,
    }
}

/// Coerce an aggregate result to an integer count.
pub(crate) fn value_to_count(value: Option<Value>) -> i64 {
    match value {
        Some(Value::Int(i)) => i,
        Some(Value::Float(f)) => f as i64,
        Some(Value::Text(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Coerce an aggregate result to a numeric value.
pub(crate) fn value_to_numeric(value: Option<Value>) -> f64 {
    match value {
        Some(Value::Int(i)) => i as f64,
        Some(Value::Float(f)) => f,
        Some(Value::Text(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests;
