//! Transactional connection.
//!
//! [`Connection`] wraps an [`Engine`] with the pieces every caller needs and
//! no engine should have to reimplement: nested-transaction bookkeeping,
//! isolation-level application, parameter normalization, read-only gating,
//! error translation and per-statement logging.
//!
//! Transaction state is a plain depth counter: 0 means no transaction, 1 a
//! real transaction, above that a named savepoint per level (`tx_<depth>`).
//! A single connection is not meant for concurrent use; the counter is
//! atomic only so the type stays `Sync` for runtimes that require it, not as
//! a synchronization protocol.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::compiler::QueryCompiler;
use crate::dialect::{Dialect, IsolationLevel};
use crate::engine::{Engine, EngineError, Row};
use crate::error::{DbError, DbResult};
use crate::params::Params;
use crate::qb::{BuilderContext, QueryFactory};
use crate::quote::Quoter;
use crate::value::Value;

fn savepoint_name(depth: u32) -> String {
    format!("tx_{depth}")
}

/// A connection to one relational engine, bound to one dialect.
pub struct Connection<E: Engine> {
    engine: E,
    dialect: Dialect,
    prefix: String,
    read_only: bool,
    depth: AtomicU32,
}

impl<E: Engine> Connection<E> {
    pub fn new(engine: E, dialect: Dialect) -> Self {
        Self {
            engine,
            dialect,
            prefix: String::new(),
            read_only: false,
            depth: AtomicU32::new(0),
        }
    }

    /// Table prefix applied by builders to every named table.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Mark the connection read-only: writes and transactions fail fast,
    /// before any SQL reaches the engine.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Identifier quoter for this connection's dialect.
    pub fn quoter(&self) -> Quoter {
        self.dialect.quoter()
    }

    /// Query compiler for this connection's dialect.
    pub fn compiler(&self) -> QueryCompiler {
        self.dialect.compiler()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Table name with the connection prefix applied.
    pub fn table(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Current transaction nesting depth (0 = no open transaction).
    pub fn transaction_depth(&self) -> u32 {
        self.depth.load(Ordering::Relaxed)
    }

    /// Query-builder factory bound to this connection's dialect and prefix.
    pub fn query(&self) -> QueryFactory {
        QueryFactory::from_context(BuilderContext::new(self.dialect, self.prefix.clone()))
    }

    // ==================== Execution ====================

    /// Run a statement and return every row.
    pub async fn fetch_all(&self, sql: &str, params: &Params) -> DbResult<Vec<Row>> {
        let bound = normalize_params(params.clone());
        let started = Instant::now();
        match self.engine.fetch_all(sql, &bound).await {
            Ok(rows) => {
                self.log_success(sql, params, started);
                Ok(rows)
            }
            Err(e) => Err(self.fail(sql, params, started, e)),
        }
    }

    /// Run a statement and return the first row, if any.
    pub async fn fetch_one(&self, sql: &str, params: &Params) -> DbResult<Option<Row>> {
        let bound = normalize_params(params.clone());
        let started = Instant::now();
        match self.engine.fetch_one(sql, &bound).await {
            Ok(row) => {
                self.log_success(sql, params, started);
                Ok(row)
            }
            Err(e) => Err(self.fail(sql, params, started, e)),
        }
    }

    /// Run a write statement and return the affected row count.
    pub async fn execute(&self, sql: &str, params: &Params) -> DbResult<u64> {
        if self.read_only {
            return Err(DbError::read_only("This connection is read-only."));
        }

        let bound = normalize_params(params.clone());
        let started = Instant::now();
        match self.engine.execute(sql, &bound).await {
            Ok(count) => {
                self.log_success(sql, params, started);
                Ok(count)
            }
            Err(e) => Err(self.fail(sql, params, started, e)),
        }
    }

    /// Identifier of the last inserted row.
    pub async fn last_insert_id(&self) -> DbResult<String> {
        self.engine
            .last_insert_id()
            .await
            .map_err(|e| self.translate(e, &Params::new()))
    }

    // ==================== Transactions ====================

    /// Run `f` inside a transaction: commit on `Ok`, roll back and re-raise
    /// on `Err`. This is the sanctioned way to run multi-statement units of
    /// work; the manual begin/commit/rollback entry points exist for test
    /// tooling.
    ///
    /// ```ignore
    /// let conn = Connection::new(engine, Dialect::Postgres);
    /// conn.transaction(None, || async {
    ///     conn.execute("UPDATE accounts SET balance = balance - :amt WHERE id = :id",
    ///         &params! { "amt" => 100, "id" => 1 }).await?;
    ///     conn.execute("UPDATE accounts SET balance = balance + :amt WHERE id = :id",
    ///         &params! { "amt" => 100, "id" => 2 }).await?;
    ///     Ok(())
    /// }).await?;
    /// ```
    pub async fn transaction<T, Fut>(
        &self,
        isolation: Option<IsolationLevel>,
        f: impl FnOnce() -> Fut,
    ) -> DbResult<T>
    where
        Fut: Future<Output = DbResult<T>>,
    {
        if self.read_only {
            return Err(DbError::read_only(
                "Transactions are not allowed for read-only connections.",
            ));
        }

        self.begin_transaction(isolation).await?;
        match f().await {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => match self.rollback().await {
                Ok(()) => Err(e),
                Err(rollback_err) => Err(DbError::query(
                    format!("{e} (rollback failed: {rollback_err})"),
                    None,
                )),
            },
        }
    }

    /// Open a transaction or, when one is already open, a savepoint.
    ///
    /// The isolation level only applies to the outermost transaction and is
    /// silently ignored for nested calls.
    pub async fn begin_transaction(&self, isolation: Option<IsolationLevel>) -> DbResult<()> {
        let depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;

        if depth == 1 {
            info!(
                isolation = isolation.map(|l| l.as_sql()),
                "Begin transaction"
            );
            if let Err(e) = self.open_real_transaction(isolation).await {
                self.depth.store(0, Ordering::Relaxed);
                return Err(e);
            }
            return Ok(());
        }

        let name = savepoint_name(depth);
        if let Err(e) = self.engine.exec(&format!("SAVEPOINT {name}")).await {
            self.depth.fetch_sub(1, Ordering::Relaxed);
            return Err(self.translate(e, &Params::new()));
        }
        Ok(())
    }

    async fn open_real_transaction(&self, isolation: Option<IsolationLevel>) -> DbResult<()> {
        self.engine
            .exec("BEGIN")
            .await
            .map_err(|e| self.translate(e, &Params::new()))?;

        if let Some(level) = isolation {
            if let Err(e) = self.apply_isolation_level(level).await {
                // The transaction did open; close it before reporting.
                if let Err(rb) = self.engine.exec("ROLLBACK").await {
                    error!(error = %rb, "Rollback after failed isolation setup failed");
                }
                return Err(e);
            }
        }
        Ok(())
    }

    async fn apply_isolation_level(&self, level: IsolationLevel) -> DbResult<()> {
        let sql = match self.dialect {
            Dialect::Sqlite => {
                let value = if level == IsolationLevel::ReadUncommitted { "1" } else { "0" };
                format!("PRAGMA read_uncommitted = {value}")
            }
            Dialect::Postgres | Dialect::MariaDb => {
                format!("SET TRANSACTION ISOLATION LEVEL {}", level.as_sql())
            }
        };

        self.engine
            .exec(&sql)
            .await
            .map_err(|e| self.translate(e, &Params::new()))
    }

    /// Commit the current level: the real transaction at depth 1, a
    /// savepoint release above that.
    ///
    /// Committing with no open transaction is a recoverable caller mistake:
    /// depth resets to 0 and a warning is logged.
    pub async fn commit(&self) -> DbResult<()> {
        let depth = self.depth.load(Ordering::Relaxed);
        if depth == 0 {
            warn!("Attempt to commit a transaction that has not yet begun");
            return Ok(());
        }

        self.depth.store(depth - 1, Ordering::Relaxed);

        if depth == 1 {
            info!("Commit transaction");
            return self
                .engine
                .exec("COMMIT")
                .await
                .map_err(|e| self.translate(e, &Params::new()));
        }

        let name = savepoint_name(depth);
        self.engine
            .exec(&format!("RELEASE SAVEPOINT {name}"))
            .await
            .map_err(|e| self.translate(e, &Params::new()))
    }

    /// Roll back the current level: the real transaction at depth 1, a
    /// rollback-to-savepoint above that (outer state stays untouched).
    ///
    /// Rolling back with no open transaction resets depth and logs a
    /// warning.
    pub async fn rollback(&self) -> DbResult<()> {
        let depth = self.depth.load(Ordering::Relaxed);
        if depth == 0 {
            warn!("Attempt to rollback a transaction that has not yet begun");
            return Ok(());
        }

        self.depth.store(depth - 1, Ordering::Relaxed);

        if depth == 1 {
            info!("Rollback transaction");
            return self
                .engine
                .exec("ROLLBACK")
                .await
                .map_err(|e| self.translate(e, &Params::new()));
        }

        let name = savepoint_name(depth);
        self.engine
            .exec(&format!("ROLLBACK TO SAVEPOINT {name}"))
            .await
            .map_err(|e| self.translate(e, &Params::new()))
    }

    // ==================== Internals ====================

    fn log_success(&self, sql: &str, params: &Params, started: Instant) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(
            sql,
            params = %display_params(params),
            elapsed_ms,
            "DB query executed"
        );
    }

    fn fail(&self, sql: &str, params: &Params, started: Instant, e: EngineError) -> DbError {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        error!(
            sql,
            params = %display_params(params),
            elapsed_ms,
            error = %e,
            "DB query failed"
        );
        self.translate(e, params)
    }

    fn translate(&self, e: EngineError, params: &Params) -> DbError {
        DbError::Query {
            message: e.message,
            code: e.code,
            param_keys: params.keys().map(String::from).collect(),
        }
    }
}

/// Prepare parameters for binding: canonical string timestamps, `:`-prefixed
/// named keys. All-digit (positional) keys pass through unchanged.
fn normalize_params(params: Params) -> Vec<(String, Value)> {
    params
        .into_entries()
        .into_iter()
        .map(|(key, value)| {
            let value = value.normalize_temporal();
            let is_positional = !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit());
            let key = if is_positional || key.starts_with(':') {
                key
            } else {
                format!(":{key}")
            };
            (key, value)
        })
        .collect()
}

/// Parameter keys and stringified values for the statement log.
fn display_params(params: &Params) -> String {
    let parts: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{k}={}", v.display()))
        .collect();
    parts.join(", ")
}
