//! UPDATE query builder.

use crate::compiler::CompiledQuery;
use crate::condition::ConditionTree;
use crate::connection::Connection;
use crate::engine::Engine;
use crate::error::DbResult;
use crate::qb::BuilderContext;
use crate::value::Value;

/// SET field: a bound value or a raw SQL expression.
#[derive(Clone, Debug)]
pub enum SetValue {
    /// Compiles to a fresh `:v_<n>` placeholder.
    Value(Value),
    /// Embedded as-is, e.g. `counter + 1`.
    Raw(String),
}

/// UPDATE query builder.
#[derive(Clone, Debug)]
pub struct UpdateBuilder {
    pub(crate) ctx: BuilderContext,
    table: String,
    data: Vec<(String, SetValue)>,
    pub(crate) where_tree: ConditionTree,
    pub(crate) param_counter: u32,
}

impl UpdateBuilder {
    pub(crate) fn new(ctx: BuilderContext, table: &str) -> Self {
        let table = ctx.apply_prefix(table);
        Self {
            ctx,
            table,
            data: Vec::new(),
            where_tree: ConditionTree::new(),
            param_counter: 0,
        }
    }

    /// Set one column value, replacing an earlier value for the same column.
    pub fn set(self, column: &str, value: impl Into<Value>) -> Self {
        self.set_internal(column, SetValue::Value(value.into()))
    }

    /// Set a column to a raw SQL expression, e.g. `visits + 1`.
    pub fn set_raw(self, column: &str, expr: &str) -> Self {
        self.set_internal(column, SetValue::Raw(expr.trim().to_string()))
    }

    fn set_internal(mut self, column: &str, value: SetValue) -> Self {
        let column = column.trim();
        if column.is_empty() {
            return self;
        }

        if let Some(entry) = self.data.iter_mut().find(|(c, _)| c == column) {
            entry.1 = value;
        } else {
            self.data.push((column.to_string(), value));
        }
        self
    }

    /// Render the statement for this builder's dialect.
    pub fn compile(&self) -> CompiledQuery {
        self.ctx.compiler().compile_update(self)
    }

    /// Execute, returning the affected row count.
    pub async fn execute<E: Engine>(&self, conn: &Connection<E>) -> DbResult<u64> {
        let compiled = self.compile();
        conn.execute(&compiled.sql, &compiled.params).await
    }

    // ==================== Accessors for the compiler ====================

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn data(&self) -> &[(String, SetValue)] {
        &self.data
    }
}

crate::qb::clauses::impl_where_api!(UpdateBuilder);
