//! SELECT query builder.

use serde::Serialize;

use crate::compiler::{CompiledQuery, AGG_ALIAS};
use crate::condition::ConditionTree;
use crate::connection::Connection;
use crate::engine::{Engine, Row};
use crate::error::DbResult;
use crate::params::Params;
use crate::qb::subquery::Subquery;
use crate::qb::{prefix_table_spec, value_to_count, value_to_numeric, BuilderContext};
use crate::value::Value;

/// Join flavor, rendered in declared order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
        }
    }
}

/// One JOIN clause: target, ON fragment, and join-local parameters
/// (populated by subquery joins).
#[derive(Clone, Debug)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    /// Raw targets (expressions, derived tables) skip quoting and prefixing.
    pub raw: bool,
    pub on: String,
    pub params: Params,
}

/// ORDER BY direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

impl OrderDir {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDir::Asc => "ASC",
            OrderDir::Desc => "DESC",
        }
    }
}

/// One ORDER BY entry.
#[derive(Clone, Debug)]
pub struct OrderBy {
    pub column: String,
    pub direction: OrderDir,
}

/// UNION flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnionKind {
    Distinct,
    All,
}

impl UnionKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            UnionKind::Distinct => "UNION",
            UnionKind::All => "UNION ALL",
        }
    }
}

/// A UNION branch, stored pre-compiled.
#[derive(Clone, Debug)]
pub struct UnionClause {
    pub kind: UnionKind,
    pub query: String,
    pub params: Params,
}

/// One page of results plus pagination bookkeeping.
#[derive(Clone, Debug, Serialize)]
pub struct Page {
    pub items: Vec<Row>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    /// Number of the last page (at least 1).
    pub fn last_page(&self) -> i64 {
        if self.total <= 0 {
            return 1;
        }
        (self.total + self.per_page - 1) / self.per_page
    }
}

/// SELECT query builder.
///
/// Accumulates projection, source, joins, WHERE/HAVING trees, grouping,
/// ordering, pagination bounds and unions; `compile()` renders the dialect's
/// SQL plus the named-parameter map.
#[derive(Clone, Debug)]
pub struct SelectBuilder {
    pub(crate) ctx: BuilderContext,
    columns: Vec<String>,
    from: Option<String>,
    from_is_raw: bool,
    from_subquery_params: Params,
    joins: Vec<JoinClause>,
    pub(crate) where_tree: ConditionTree,
    having_tree: ConditionTree,
    group_by: Vec<String>,
    order_by: Vec<OrderBy>,
    limit: Option<i64>,
    offset: Option<i64>,
    distinct: bool,
    unions: Vec<UnionClause>,
    select_subquery_params: Params,
    pub(crate) param_counter: u32,
}

impl SelectBuilder {
    pub(crate) fn new(ctx: BuilderContext, columns: &[&str]) -> Self {
        let mut builder = Self {
            ctx,
            columns: Vec::new(),
            from: None,
            from_is_raw: false,
            from_subquery_params: Params::new(),
            joins: Vec::new(),
            where_tree: ConditionTree::new(),
            having_tree: ConditionTree::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
            unions: Vec::new(),
            select_subquery_params: Params::new(),
            param_counter: 0,
        };
        builder.append_columns(columns);
        builder
    }

    // ==================== Projection ====================

    /// Add projection columns. Replaces an initial bare `*`; appends
    /// otherwise. Expressions with parentheses pass through the compiler
    /// unquoted (except their `AS alias`).
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.append_columns(columns);
        self
    }

    fn append_columns(&mut self, columns: &[&str]) {
        for column in columns {
            let column = column.trim();
            if column.is_empty() {
                continue;
            }
            if self.columns.len() == 1 && self.columns[0] == "*" {
                self.columns[0] = column.to_string();
            } else {
                self.columns.push(column.to_string());
            }
        }
    }

    /// Project `EXISTS (<subquery>) AS <alias>`.
    ///
    /// The subquery's parameters join the statement's parameter map.
    pub fn select_exists(self, subquery: impl Into<Subquery>, alias: &str) -> Self {
        self.select_exists_internal(subquery.into(), alias, false)
    }

    /// Project `NOT EXISTS (<subquery>) AS <alias>`.
    pub fn select_not_exists(self, subquery: impl Into<Subquery>, alias: &str) -> Self {
        self.select_exists_internal(subquery.into(), alias, true)
    }

    fn select_exists_internal(mut self, subquery: Subquery, alias: &str, not: bool) -> Self {
        let alias = alias.trim();
        let alias = if alias.is_empty() {
            if not { "not_exists" } else { "exists" }
        } else {
            alias
        };

        let compiled = subquery.lower(&self.ctx);
        let sub_sql = compiled.sql.trim();
        if sub_sql.is_empty() {
            return self;
        }

        let quoted_alias = self.ctx.quoter().alias(alias);
        let prefix = if not { "NOT " } else { "" };
        let expr = format!("{prefix}EXISTS ({sub_sql}) AS {quoted_alias}");

        self = self.select(&[&expr]);
        self.select_subquery_params.merge(compiled.params);
        self
    }

    /// SELECT DISTINCT.
    pub fn distinct(mut self, enabled: bool) -> Self {
        self.distinct = enabled;
        self
    }

    // ==================== FROM ====================

    /// Set the source table (`users`, `users u`, `schema.users u`). The
    /// connection's table prefix is applied to the name part.
    pub fn from(mut self, table: &str) -> Self {
        let table = table.trim();
        if table.is_empty() {
            return self;
        }

        self.from = Some(prefix_table_spec(&self.ctx, table));
        self.from_is_raw = false;
        self
    }

    /// Set the source to a raw expression; no prefixing, no quoting.
    pub fn from_raw(mut self, sql: &str) -> Self {
        let sql = sql.trim();
        if sql.is_empty() {
            return self;
        }

        self.from = Some(sql.to_string());
        self.from_is_raw = true;
        self
    }

    /// `FROM (<subquery>) AS alias`.
    pub fn from_subquery(mut self, subquery: impl Into<Subquery>, alias: &str) -> Self {
        let alias = alias.trim();
        if alias.is_empty() {
            return self;
        }

        let compiled = subquery.into().lower(&self.ctx);
        let sub_sql = compiled.sql.trim();
        if sub_sql.is_empty() {
            return self;
        }

        let quoted_alias = self.ctx.quoter().alias(alias);
        self.from = Some(format!("({sub_sql}) AS {quoted_alias}"));
        self.from_is_raw = true;
        self.from_subquery_params = compiled.params;
        self
    }

    // ==================== JOIN ====================

    /// INNER JOIN (alias for [`SelectBuilder::inner_join`]).
    pub fn join(self, table: &str, on: &str) -> Self {
        self.inner_join(table, on)
    }

    pub fn inner_join(self, table: &str, on: &str) -> Self {
        self.add_join(JoinKind::Inner, table, on, false)
    }

    pub fn left_join(self, table: &str, on: &str) -> Self {
        self.add_join(JoinKind::Left, table, on, false)
    }

    pub fn right_join(self, table: &str, on: &str) -> Self {
        self.add_join(JoinKind::Right, table, on, false)
    }

    /// JOIN against a raw target expression; no prefixing, no quoting.
    pub fn inner_join_raw(self, sql: &str, on: &str) -> Self {
        self.add_join(JoinKind::Inner, sql, on, true)
    }

    pub fn left_join_raw(self, sql: &str, on: &str) -> Self {
        self.add_join(JoinKind::Left, sql, on, true)
    }

    pub fn right_join_raw(self, sql: &str, on: &str) -> Self {
        self.add_join(JoinKind::Right, sql, on, true)
    }

    fn add_join(mut self, kind: JoinKind, table: &str, on: &str, raw: bool) -> Self {
        let table = table.trim();
        let on = on.trim();
        if table.is_empty() || on.is_empty() {
            return self;
        }

        let table = if raw {
            table.to_string()
        } else {
            prefix_table_spec(&self.ctx, table)
        };

        self.joins.push(JoinClause {
            kind,
            table,
            raw,
            on: on.to_string(),
            params: Params::new(),
        });
        self
    }

    /// `INNER JOIN (<subquery>) AS alias ON ...`
    pub fn join_subquery(self, subquery: impl Into<Subquery>, alias: &str, on: &str) -> Self {
        self.add_join_subquery(JoinKind::Inner, subquery.into(), alias, on)
    }

    /// `LEFT JOIN (<subquery>) AS alias ON ...`
    pub fn left_join_subquery(self, subquery: impl Into<Subquery>, alias: &str, on: &str) -> Self {
        self.add_join_subquery(JoinKind::Left, subquery.into(), alias, on)
    }

    /// `RIGHT JOIN (<subquery>) AS alias ON ...`
    pub fn right_join_subquery(self, subquery: impl Into<Subquery>, alias: &str, on: &str) -> Self {
        self.add_join_subquery(JoinKind::Right, subquery.into(), alias, on)
    }

    fn add_join_subquery(mut self, kind: JoinKind, subquery: Subquery, alias: &str, on: &str) -> Self {
        let alias = alias.trim();
        let on = on.trim();
        if alias.is_empty() || on.is_empty() {
            return self;
        }

        let compiled = subquery.lower(&self.ctx);
        let sub_sql = compiled.sql.trim();
        if sub_sql.is_empty() {
            return self;
        }

        let quoted_alias = self.ctx.quoter().alias(alias);
        self.joins.push(JoinClause {
            kind,
            table: format!("({sub_sql}) AS {quoted_alias}"),
            raw: true,
            on: on.to_string(),
            params: compiled.params,
        });
        self
    }

    // ==================== HAVING ====================

    /// Add a HAVING condition joined with AND.
    pub fn having(mut self, sql: &str, params: Params) -> Self {
        self.having_tree
            .push_leaf(crate::condition::Connector::And, sql, params);
        self
    }

    /// Add a HAVING condition joined with OR.
    pub fn or_having(mut self, sql: &str, params: Params) -> Self {
        self.having_tree
            .push_leaf(crate::condition::Connector::Or, sql, params);
        self
    }

    /// Group HAVING conditions in parentheses, joined with AND.
    pub fn having_group(mut self, f: impl FnOnce(Self) -> Self) -> Self {
        self.having_tree.begin_group(crate::condition::Connector::And);
        let mut this = f(self);
        this.having_tree.end_group();
        this
    }

    /// Group HAVING conditions in parentheses, joined with OR.
    pub fn or_having_group(mut self, f: impl FnOnce(Self) -> Self) -> Self {
        self.having_tree.begin_group(crate::condition::Connector::Or);
        let mut this = f(self);
        this.having_tree.end_group();
        this
    }

    // ==================== Grouping & ordering ====================

    pub fn group_by(mut self, columns: &[&str]) -> Self {
        for column in columns {
            let column = column.trim();
            if !column.is_empty() {
                self.group_by.push(column.to_string());
            }
        }
        self
    }

    pub fn order_by(mut self, column: &str, direction: OrderDir) -> Self {
        let column = column.trim();
        if column.is_empty() {
            return self;
        }
        self.order_by.push(OrderBy {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, OrderDir::Asc)
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, OrderDir::Desc)
    }

    // ==================== Pagination bounds ====================

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit.max(0));
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset.max(0));
        self
    }

    // ==================== UNION ====================

    /// `UNION (<subquery>)`.
    pub fn union(self, query: impl Into<Subquery>) -> Self {
        self.union_internal(UnionKind::Distinct, query.into())
    }

    /// `UNION ALL (<subquery>)`.
    pub fn union_all(self, query: impl Into<Subquery>) -> Self {
        self.union_internal(UnionKind::All, query.into())
    }

    fn union_internal(mut self, kind: UnionKind, query: Subquery) -> Self {
        let compiled = query.lower(&self.ctx);
        let sql = compiled.sql.trim();
        if sql.is_empty() {
            return self;
        }

        self.unions.push(UnionClause {
            kind,
            query: sql.to_string(),
            params: compiled.params,
        });
        self
    }

    // ==================== Compile & execute ====================

    /// Render the statement for this builder's dialect.
    pub fn compile(&self) -> CompiledQuery {
        self.ctx.compiler().compile_select(self)
    }

    pub async fn fetch_all<E: Engine>(&self, conn: &Connection<E>) -> DbResult<Vec<Row>> {
        let compiled = self.compile();
        conn.fetch_all(&compiled.sql, &compiled.params).await
    }

    pub async fn fetch_one<E: Engine>(&self, conn: &Connection<E>) -> DbResult<Option<Row>> {
        let compiled = self.compile();
        conn.fetch_one(&compiled.sql, &compiled.params).await
    }

    /// Alias for [`SelectBuilder::fetch_one`].
    pub async fn first<E: Engine>(&self, conn: &Connection<E>) -> DbResult<Option<Row>> {
        self.fetch_one(conn).await
    }

    /// Fetch the first row and pull one column out of it.
    pub async fn value<E: Engine>(&self, conn: &Connection<E>, column: &str) -> DbResult<Option<Value>> {
        let column = column.trim();
        if column.is_empty() {
            return Ok(None);
        }

        let row = self.fetch_one(conn).await?;
        Ok(row.and_then(|mut r| r.remove(column)))
    }

    // ==================== Aggregates ====================

    /// `COUNT(column)` with ORDER BY/LIMIT/OFFSET stripped; WHERE and
    /// GROUP BY are preserved.
    pub async fn count<E: Engine>(&self, conn: &Connection<E>) -> DbResult<i64> {
        let value = self.aggregate(conn, "COUNT", "*").await?;
        Ok(value_to_count(value))
    }

    pub async fn sum<E: Engine>(&self, conn: &Connection<E>, column: &str) -> DbResult<f64> {
        let value = self.aggregate(conn, "SUM", column).await?;
        Ok(value_to_numeric(value))
    }

    pub async fn avg<E: Engine>(&self, conn: &Connection<E>, column: &str) -> DbResult<f64> {
        let value = self.aggregate(conn, "AVG", column).await?;
        Ok(value_to_numeric(value))
    }

    pub async fn min<E: Engine>(&self, conn: &Connection<E>, column: &str) -> DbResult<Option<Value>> {
        self.aggregate(conn, "MIN", column).await
    }

    pub async fn max<E: Engine>(&self, conn: &Connection<E>, column: &str) -> DbResult<Option<Value>> {
        self.aggregate(conn, "MAX", column).await
    }

    async fn aggregate<E: Engine>(
        &self,
        conn: &Connection<E>,
        func: &str,
        column: &str,
    ) -> DbResult<Option<Value>> {
        let column = column.trim();
        if column.is_empty() {
            return Ok(None);
        }

        let mut q = self.clone();
        q.order_by.clear();
        q.limit = None;
        q.offset = None;
        q.columns = vec![format!("{func}({column}) AS {AGG_ALIAS}")];

        let row = q.fetch_one(conn).await?;
        Ok(row.and_then(|mut r| r.remove(AGG_ALIAS)))
    }

    /// Fetch one page plus the total row count.
    ///
    /// `page` and `per_page` are floored to 1. The total is taken through the
    /// count path with the same WHERE state, before limit/offset apply.
    pub async fn paginate<E: Engine>(
        &self,
        conn: &Connection<E>,
        page: i64,
        per_page: i64,
    ) -> DbResult<Page> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let total = self.count(conn).await?;
        let offset = (page - 1) * per_page;

        let items = self
            .clone()
            .limit(per_page)
            .offset(offset)
            .fetch_all(conn)
            .await?;

        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    // ==================== Accessors for the compiler ====================

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn from_value(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn from_is_raw(&self) -> bool {
        self.from_is_raw
    }

    pub fn from_subquery_params(&self) -> &Params {
        &self.from_subquery_params
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn group_by_columns(&self) -> &[String] {
        &self.group_by
    }

    pub fn having_nodes(&self) -> &[crate::condition::ConditionNode] {
        self.having_tree.nodes()
    }

    pub fn order_by_clauses(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn unions(&self) -> &[UnionClause] {
        &self.unions
    }

    pub fn select_subquery_params(&self) -> &Params {
        &self.select_subquery_params
    }

    /// Clone with ORDER BY / LIMIT / OFFSET cleared.
    ///
    /// Most engines scope those clauses to the whole UNION result, so the
    /// unioned base statement compiles without paging and gets wrapped.
    pub fn reset_pagination_and_order_for_union(&self) -> Self {
        let mut clone = self.clone();
        clone.order_by.clear();
        clone.limit = None;
        clone.offset = None;
        clone
    }
}

crate::qb::clauses::impl_where_api!(SelectBuilder);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::params;
    use crate::qb::QueryFactory;

    fn query() -> QueryFactory {
        QueryFactory::new(Dialect::Postgres)
    }

    #[test]
    fn simple_select() {
        let compiled = query().select(&[]).from("users").compile();
        assert_eq!(compiled.sql, r#"SELECT * FROM "users""#);
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn select_columns_replace_initial_star() {
        let compiled = query().select(&["*"]).select(&["id", "name"]).from("users").compile();
        assert_eq!(compiled.sql, r#"SELECT "id", "name" FROM "users""#);
    }

    #[test]
    fn where_and_params_merge() {
        let compiled = query()
            .select(&[])
            .from("users")
            .and_where("id = :id", params! { "id" => 10 })
            .and_where("name = :name", params! { "name" => "Alice" })
            .compile();
        assert_eq!(
            compiled.sql,
            r#"SELECT * FROM "users" WHERE ("id" = :id) AND ("name" = :name)"#
        );
        assert_eq!(compiled.params.len(), 2);
    }

    #[test]
    fn from_with_alias() {
        let compiled = query().select(&[]).from("users u").compile();
        assert_eq!(compiled.sql, r#"SELECT * FROM "users" AS "u""#);
    }

    #[test]
    fn from_raw_is_untouched() {
        let compiled = query().select(&[]).from_raw("users u").compile();
        assert_eq!(compiled.sql, "SELECT * FROM users u");
    }

    #[test]
    fn join_quotes_and_prefixes_like_from() {
        let q = QueryFactory::with_prefix(Dialect::Postgres, "t_");
        let compiled = q
            .select(&[])
            .from("a")
            .left_join("b", "b.a_id = a.id")
            .compile();
        assert_eq!(
            compiled.sql,
            r#"SELECT * FROM "t_a" LEFT JOIN "t_b" ON "b"."a_id" = "a"."id""#
        );
    }

    #[test]
    fn group_by_and_having() {
        let compiled = query()
            .select(&["client_id", "COUNT(*) AS cnt"])
            .from("orders")
            .group_by(&["client_id"])
            .having("COUNT(*) > :min", params! { "min" => 10 })
            .compile();
        assert_eq!(
            compiled.sql,
            r#"SELECT "client_id", COUNT(*) AS "cnt" FROM "orders" GROUP BY "client_id" HAVING (COUNT(*) > :min)"#
        );
    }

    #[test]
    fn order_limit_offset() {
        let compiled = query()
            .select(&[])
            .from("users")
            .order_by_desc("created_at")
            .limit(10)
            .offset(20)
            .compile();
        assert_eq!(
            compiled.sql,
            r#"SELECT * FROM "users" ORDER BY "created_at" DESC LIMIT 10 OFFSET 20"#
        );
    }

    #[test]
    fn negative_bounds_are_clamped() {
        let compiled = query().select(&[]).from("users").limit(-5).offset(-1).compile();
        assert_eq!(compiled.sql, r#"SELECT * FROM "users" LIMIT 0 OFFSET 0"#);
    }

    #[test]
    fn distinct_flag() {
        let compiled = query().select(&["city"]).from("users").distinct(true).compile();
        assert_eq!(compiled.sql, r#"SELECT DISTINCT "city" FROM "users""#);
    }

    #[test]
    fn where_in_subquery_with_closure() {
        let compiled = query()
            .select(&[])
            .from("users")
            .where_in_subquery(
                "id",
                Subquery::build(|q| {
                    q.select(&["user_id"])
                        .from("orders")
                        .and_where("status = :st", params! { "st" => "paid" })
                }),
            )
            .compile();
        assert_eq!(
            compiled.sql,
            r#"SELECT * FROM "users" WHERE (id IN (SELECT "user_id" FROM "orders" WHERE ("status" = :st)))"#
        );
        assert!(compiled.params.contains_key("st"));
    }

    #[test]
    fn where_exists_not_variant() {
        let compiled = query()
            .select(&[])
            .from("users")
            .where_not_exists(Subquery::raw("SELECT 1 FROM bans WHERE bans.user_id = users.id"))
            .compile();
        assert_eq!(
            compiled.sql,
            r#"SELECT * FROM "users" WHERE (NOT EXISTS (SELECT 1 FROM bans WHERE bans.user_id = users.id))"#
        );
    }

    #[test]
    fn select_exists_merges_params() {
        let compiled = query()
            .select(&["id"])
            .from("users")
            .select_exists(
                Subquery::build(|q| {
                    q.select(&["1"])
                        .from("orders")
                        .and_where("total > :min_total", params! { "min_total" => 100 })
                }),
                "has_big_order",
            )
            .compile();
        assert!(compiled.sql.contains(r#"EXISTS (SELECT 1 FROM "orders" WHERE ("total" > :min_total)) AS "has_big_order""#));
        assert!(compiled.params.contains_key("min_total"));
    }

    #[test]
    fn from_subquery_carries_params() {
        let compiled = query()
            .select(&[])
            .from_subquery(
                Subquery::build(|q| {
                    q.select(&["id"])
                        .from("orders")
                        .and_where("status = :st", params! { "st" => "new" })
                }),
                "o",
            )
            .compile();
        assert_eq!(
            compiled.sql,
            r#"SELECT * FROM (SELECT "id" FROM "orders" WHERE ("status" = :st)) AS "o""#
        );
        assert!(compiled.params.contains_key("st"));
    }

    #[test]
    fn join_subquery_carries_params() {
        let compiled = query()
            .select(&[])
            .from("users")
            .left_join_subquery(
                Subquery::build(|q| {
                    q.select(&["user_id"])
                        .from("orders")
                        .and_where("status = :st", params! { "st" => "paid" })
                }),
                "o",
                "o.user_id = users.id",
            )
            .compile();
        assert!(compiled.sql.contains(
            r#"LEFT JOIN (SELECT "user_id" FROM "orders" WHERE ("status" = :st)) AS "o" ON "o"."user_id" = "users"."id""#
        ));
        assert!(compiled.params.contains_key("st"));
    }

    #[test]
    fn union_without_pagination_does_not_wrap() {
        let other = query().select(&["id"]).from("archived_users");
        let compiled = query().select(&["id"]).from("users").union(other).compile();
        assert_eq!(
            compiled.sql,
            r#"SELECT "id" FROM "users" UNION (SELECT "id" FROM "archived_users")"#
        );
    }

    #[test]
    fn union_with_order_wraps() {
        let other = query().select(&["id"]).from("archived_users");
        let compiled = query()
            .select(&["id"])
            .from("users")
            .union_all(other)
            .order_by_asc("id")
            .limit(10)
            .compile();
        assert_eq!(
            compiled.sql,
            r#"SELECT * FROM (SELECT "id" FROM "users" UNION ALL (SELECT "id" FROM "archived_users")) AS _u ORDER BY "id" ASC LIMIT 10"#
        );
    }

    #[test]
    fn union_params_survive_wrapping() {
        let other = query()
            .select(&["id"])
            .from("archived_users")
            .and_where("archived_at > :cutoff", params! { "cutoff" => "2024-01-01" });
        let compiled = query()
            .select(&["id"])
            .from("users")
            .union(other)
            .limit(5)
            .compile();
        assert!(compiled.sql.starts_with("SELECT * FROM ("));
        assert!(compiled.params.contains_key("cutoff"));
    }
}
