//! Query compilation: builder state → dialect-correct SQL + parameter map.
//!
//! One [`QueryCompiler`] serves every dialect; the dialects differ only in
//! the identifier [`Quoter`] it is constructed with. Clause order is fixed:
//! SELECT → FROM → JOIN → WHERE → GROUP BY → HAVING → ORDER BY →
//! LIMIT/OFFSET → UNION.

mod condition;

pub use condition::{ConditionTreeCompiler, FragmentQuoter};

use crate::params::Params;
use crate::qb::delete::DeleteBuilder;
use crate::qb::insert::InsertBuilder;
use crate::qb::select::SelectBuilder;
use crate::qb::update::{SetValue, UpdateBuilder};
use crate::quote::Quoter;

/// Alias given to the derived table when a UNION query has to be wrapped to
/// re-apply ordering and pagination.
const UNION_WRAP_ALIAS: &str = "_u";

/// Internal result key for aggregate projections; intentionally left
/// unquoted so row access by `__agg` works across dialects.
pub(crate) const AGG_ALIAS: &str = "__agg";

/// A rendered statement: SQL text plus its named-parameter map.
///
/// Invariant: every named placeholder in `sql` has exactly one entry in
/// `params` and vice versa.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Params,
}

impl CompiledQuery {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Renders builder state into SQL for one dialect.
#[derive(Clone, Copy, Debug)]
pub struct QueryCompiler {
    quoter: Quoter,
}

impl QueryCompiler {
    pub fn new(quoter: Quoter) -> Self {
        Self { quoter }
    }

    /// The quoter this compiler renders identifiers with.
    ///
    /// Exposed so the compiler can be used as a standalone service for
    /// hand-assembled SQL checks and tests.
    pub fn quoter(&self) -> Quoter {
        self.quoter
    }

    fn fragment_quoter(&self) -> FragmentQuoter {
        FragmentQuoter::new(self.quoter)
    }

    fn tree_compiler(&self) -> ConditionTreeCompiler {
        ConditionTreeCompiler::new(self.fragment_quoter())
    }

    // ==================== SELECT ====================

    pub fn compile_select(&self, builder: &SelectBuilder) -> CompiledQuery {
        // UNION plus ORDER BY/LIMIT/OFFSET: those clauses must apply to the
        // unioned result as a whole, so the statement is compiled without
        // them and wrapped.
        let has_pagination = !builder.order_by_clauses().is_empty()
            || builder.limit_value().is_some()
            || builder.offset_value().is_some();
        if !builder.unions().is_empty() && has_pagination {
            return self.compile_select_union_wrapped(builder);
        }

        let mut columns_sql: Vec<String> = Vec::new();
        for column in builder.columns() {
            let quoted = self.quote_select_column(column);
            if !quoted.is_empty() {
                columns_sql.push(quoted);
            }
        }
        if columns_sql.is_empty() {
            columns_sql.push("*".to_string());
        }

        let mut sql = String::from("SELECT ");
        if builder.is_distinct() {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&columns_sql.join(", "));

        if let Some(from) = builder.from_value() {
            sql.push_str(" FROM ");
            if builder.from_is_raw() {
                sql.push_str(from);
            } else {
                sql.push_str(&self.quoter.table_with_optional_alias(from));
            }
        }

        let mut params = Params::new();
        params.merge(builder.from_subquery_params().clone());

        let fragment_quoter = self.fragment_quoter();

        for join in builder.joins() {
            sql.push(' ');
            sql.push_str(join.kind.as_sql());
            sql.push_str(" JOIN ");
            if join.raw {
                sql.push_str(&join.table);
            } else {
                sql.push_str(&self.quoter.table_with_optional_alias(&join.table));
            }
            sql.push_str(" ON ");
            sql.push_str(&fragment_quoter.quote(&join.on));
            params.merge(join.params.clone());
        }

        let (where_sql, where_params) = self.tree_compiler().compile(builder.where_nodes());
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
            params.merge(where_params);
        }

        let group_by = builder.group_by_columns();
        if !group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            let parts: Vec<String> = group_by.iter().map(|c| self.quoter.dotted(c)).collect();
            sql.push_str(&parts.join(", "));
        }

        let (having_sql, having_params) = self.tree_compiler().compile(builder.having_nodes());
        if !having_sql.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&having_sql);
            params.merge(having_params);
        }

        let order_by = builder.order_by_clauses();
        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by_sql(order_by));
        }

        if let Some(limit) = builder.limit_value() {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = builder.offset_value() {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        for union in builder.unions() {
            sql.push(' ');
            sql.push_str(union.kind.as_sql());
            sql.push_str(" (");
            sql.push_str(&union.query);
            sql.push(')');
            params.merge(union.params.clone());
        }

        params.merge(builder.select_subquery_params().clone());

        CompiledQuery::new(sql, params)
    }

    /// `SELECT * FROM (<union query without order/limit/offset>) AS _u ...`
    fn compile_select_union_wrapped(&self, builder: &SelectBuilder) -> CompiledQuery {
        let base = self.compile_select(&builder.reset_pagination_and_order_for_union());

        let mut sql = format!("SELECT * FROM ({}) AS {UNION_WRAP_ALIAS}", base.sql);

        let order_by = builder.order_by_clauses();
        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by_sql(order_by));
        }

        if let Some(limit) = builder.limit_value() {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = builder.offset_value() {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        CompiledQuery::new(sql, base.params)
    }

    fn order_by_sql(&self, clauses: &[crate::qb::select::OrderBy]) -> String {
        let parts: Vec<String> = clauses
            .iter()
            .map(|o| format!("{} {}", self.quote_order_by_expr(&o.column), o.direction.as_sql()))
            .collect();
        parts.join(", ")
    }

    // ==================== INSERT ====================

    pub fn compile_insert(&self, builder: &InsertBuilder) -> CompiledQuery {
        let mut sql = format!(
            "INSERT INTO {}",
            self.quoter.table_with_optional_alias(builder.table())
        );

        let data = builder.data();
        if data.is_empty() {
            sql.push_str(" DEFAULT VALUES");
            return CompiledQuery::new(sql, Params::new());
        }

        let mut params = Params::new();
        let mut placeholders: Vec<String> = Vec::with_capacity(data.len());
        let mut quoted_cols: Vec<String> = Vec::with_capacity(data.len());

        for (i, (column, value)) in data.iter().enumerate() {
            let name = format!("v_{}", i + 1);
            placeholders.push(format!(":{name}"));
            params.insert(name, value.clone());
            quoted_cols.push(self.quoter.ident(column));
        }

        sql.push_str(" (");
        sql.push_str(&quoted_cols.join(", "));
        sql.push_str(") VALUES (");
        sql.push_str(&placeholders.join(", "));
        sql.push(')');

        CompiledQuery::new(sql, params)
    }

    // ==================== UPDATE ====================

    pub fn compile_update(&self, builder: &UpdateBuilder) -> CompiledQuery {
        let mut sql = format!(
            "UPDATE {} SET ",
            self.quoter.table_with_optional_alias(builder.table())
        );

        let mut params = Params::new();
        let mut set_parts: Vec<String> = Vec::new();
        let mut counter = 0usize;

        for (column, value) in builder.data() {
            match value {
                SetValue::Value(v) => {
                    counter += 1;
                    let name = format!("v_{counter}");
                    set_parts.push(format!("{} = :{name}", self.quoter.ident(column)));
                    params.insert(name, v.clone());
                }
                SetValue::Raw(expr) => {
                    set_parts.push(format!("{} = {expr}", self.quoter.ident(column)));
                }
            }
        }

        if set_parts.is_empty() {
            set_parts.push("1 = 1".to_string());
        }

        sql.push_str(&set_parts.join(", "));

        let (where_sql, where_params) = self.tree_compiler().compile(builder.where_nodes());
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
            params.merge(where_params);
        }

        CompiledQuery::new(sql, params)
    }

    // ==================== DELETE ====================

    pub fn compile_delete(&self, builder: &DeleteBuilder) -> CompiledQuery {
        let mut sql = format!(
            "DELETE FROM {}",
            self.quoter.table_with_optional_alias(builder.table())
        );

        let mut params = Params::new();
        let (where_sql, where_params) = self.tree_compiler().compile(builder.where_nodes());
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
            params.merge(where_params);
        }

        CompiledQuery::new(sql, params)
    }

    // ==================== Column quoting rules ====================

    /// Quote a projection column or expression.
    ///
    /// Rules:
    ///  - an expression containing parentheses is a function call or raw
    ///    expression and passes through, except its `AS alias` which is
    ///    always quoted (the internal `__agg` alias excepted);
    ///  - numeric literals and `*` pass through;
    ///  - everything else is a plain or dotted identifier and is quoted.
    pub fn quote_select_column(&self, column: &str) -> String {
        let column = column.trim();
        if column.is_empty() {
            return String::new();
        }

        if column == "*" {
            return "*".to_string();
        }

        if is_numeric_literal(column) {
            return column.to_string();
        }

        if let Some(pos) = find_last_as(column) {
            let left = column[..pos].trim();
            let alias = column[pos + 4..].trim();

            if left.is_empty() {
                return column.to_string();
            }

            let left_quoted = if left.contains('(') || left.contains(')') {
                left.to_string()
            } else {
                self.quote_select_column(left)
            };

            if !alias.is_empty() {
                if alias == AGG_ALIAS {
                    return format!("{left_quoted} AS {alias}");
                }
                return format!("{left_quoted} AS {}", self.quoter.alias(alias));
            }

            return left_quoted;
        }

        if column.contains('(') || column.contains(')') {
            return column.to_string();
        }

        self.quoter.dotted(column)
    }

    /// Quote an ORDER BY expression: plain column names are quoted,
    /// parenthesized expressions pass through.
    fn quote_order_by_expr(&self, expr: &str) -> String {
        let expr = expr.trim();
        if expr.is_empty() {
            return String::new();
        }

        if expr.contains('(') || expr.contains(')') {
            return expr.to_string();
        }

        self.quoter.dotted(expr)
    }
}

fn is_numeric_literal(expr: &str) -> bool {
    let mut seen_dot = false;
    let mut seen_digit = false;
    for ch in expr.chars() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

/// Byte position of the last case-insensitive ` as ` separator.
fn find_last_as(expr: &str) -> Option<usize> {
    let lower = expr.to_ascii_lowercase();
    lower.rfind(" as ")
}
