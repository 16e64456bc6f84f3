//! # querykit
//!
//! A dialect-portable SQL construction and execution layer.
//!
//! ## Features
//!
//! - **Fluent builders**: SELECT/INSERT/UPDATE/DELETE accumulate intent, the
//!   dialect compiler renders `{sql, params}` with named placeholders
//! - **Condition trees**: AND/OR leaves and nested closure groups with exact
//!   parenthesization
//! - **Three dialects**: SQLite, PostgreSQL and MariaDB share one compiler;
//!   only identifier quoting differs
//! - **Transactional connection**: real transaction at depth 1, named
//!   savepoints (`tx_<n>`) below, isolation applied to the outermost level
//! - **Engine seam**: storage lives behind the [`Engine`] trait; a
//!   `tokio-postgres` adapter is included
//!
//! ## Building queries
//!
//! ```ignore
//! use querykit::{params, Dialect, QueryFactory, Subquery};
//!
//! let query = QueryFactory::new(Dialect::Postgres);
//!
//! let compiled = query
//!     .select(&["u.id", "u.name"])
//!     .from("users u")
//!     .left_join("orders o", "o.user_id = u.id")
//!     .and_where("u.active = :active", params! { "active" => true })
//!     .where_in("u.role", vec!["admin", "staff"])
//!     .order_by_desc("u.created_at")
//!     .limit(20)
//!     .compile();
//!
//! // compiled.sql, compiled.params
//! ```
//!
//! ## Executing
//!
//! ```ignore
//! use querykit::{params, Connection, Dialect, PgEngine};
//!
//! let engine = PgEngine::connect("host=localhost user=app dbname=app").await?;
//! let conn = Connection::new(engine, Dialect::Postgres);
//!
//! conn.transaction(None, || async {
//!     conn.query()
//!         .insert("users")
//!         .set("name", "Alice")
//!         .execute(&conn)
//!         .await?;
//!     Ok(())
//! })
//! .await?;
//! ```

pub mod compiler;
pub mod condition;
pub mod connection;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod params;
pub mod pg;
pub mod qb;
pub mod quote;
pub mod value;

pub use compiler::{CompiledQuery, ConditionTreeCompiler, FragmentQuoter, QueryCompiler};
pub use condition::{ConditionNode, ConditionTree, Connector};
pub use connection::Connection;
pub use dialect::{Dialect, IsolationLevel};
pub use engine::{Engine, EngineError, Row};
pub use error::{DbError, DbResult};
pub use params::Params;
pub use pg::PgEngine;
pub use qb::{
    BuilderContext, DeleteBuilder, InsertBuilder, OrderBy, OrderDir, Page, QueryFactory,
    SelectBuilder, Subquery, UpdateBuilder,
};
pub use quote::{QuoteStyle, Quoter};
pub use value::Value;
