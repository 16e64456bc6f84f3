//! DELETE query builder.

use crate::compiler::CompiledQuery;
use crate::condition::ConditionTree;
use crate::connection::Connection;
use crate::engine::Engine;
use crate::error::DbResult;
use crate::qb::BuilderContext;

/// DELETE query builder.
#[derive(Clone, Debug)]
pub struct DeleteBuilder {
    pub(crate) ctx: BuilderContext,
    table: String,
    pub(crate) where_tree: ConditionTree,
    pub(crate) param_counter: u32,
}

impl DeleteBuilder {
    pub(crate) fn new(ctx: BuilderContext, table: &str) -> Self {
        let table = ctx.apply_prefix(table);
        Self {
            ctx,
            table,
            where_tree: ConditionTree::new(),
            param_counter: 0,
        }
    }

    /// Render the statement for this builder's dialect.
    pub fn compile(&self) -> CompiledQuery {
        self.ctx.compiler().compile_delete(self)
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
}

crate::qb::clauses::impl_where_api!(DeleteBuilder);
