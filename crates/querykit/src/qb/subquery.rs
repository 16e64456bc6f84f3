//! Subquery sources.
//!
//! Every operation that accepts "something that compiles to a SELECT" (IN
//! subqueries, EXISTS projections, derived FROM tables, subquery joins,
//! unions) takes a [`Subquery`]. The three cases all lower to the same
//! `{sql, params}` shape before use, and callers wrap the result in
//! parentheses.

use crate::compiler::CompiledQuery;
use crate::params::Params;
use crate::qb::select::SelectBuilder;
use crate::qb::BuilderContext;

/// A subquery source: a finished builder, a raw SQL fragment, or a
/// composition closure run against a fresh builder.
pub enum Subquery {
    /// A fully configured SELECT builder.
    Select(Box<SelectBuilder>),
    /// Raw SQL embedded as-is; carries no parameters.
    Raw(String),
    /// A closure composing a fresh builder that inherits the parent's
    /// dialect and table prefix.
    Build(Box<dyn FnOnce(SelectBuilder) -> SelectBuilder>),
}

impl Subquery {
    /// Compose the subquery with a closure.
    ///
    /// ```ignore
    /// q.where_in_subquery("id", Subquery::build(|q| {
    ///     q.select(&["user_id"])
    ///         .from("orders")
    ///         .and_where("status = :st", params! { "st" => "paid" })
    /// }));
    /// ```
    pub fn build(f: impl FnOnce(SelectBuilder) -> SelectBuilder + 'static) -> Self {
        Subquery::Build(Box::new(f))
    }

    /// Use a raw SQL fragment as the subquery body.
    pub fn raw(sql: impl Into<String>) -> Self {
        Subquery::Raw(sql.into())
    }

    /// Lower to `{sql, params}`.
    ///
    /// Builders compile with their own context; closures get a fresh builder
    /// carrying the parent's context so table prefixing and quoting stay
    /// consistent; raw fragments pass through trimmed.
    pub(crate) fn lower(self, ctx: &BuilderContext) -> CompiledQuery {
        match self {
            Subquery::Select(builder) => builder.compile(),
            Subquery::Raw(sql) => CompiledQuery::new(sql.trim(), Params::new()),
            Subquery::Build(f) => f(SelectBuilder::new(ctx.clone(), &[])).compile(),
        }
    }
}

impl std::fmt::Debug for Subquery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subquery::Select(b) => f.debug_tuple("Select").field(b).finish(),
            Subquery::Raw(sql) => f.debug_tuple("Raw").field(sql).finish(),
            Subquery::Build(_) => f.debug_tuple("Build").field(&"<closure>").finish(),
        }
    }
}

impl From<SelectBuilder> for Subquery {
    fn from(builder: SelectBuilder) -> Self {
        Subquery::Select(Box::new(builder))
    }
}

impl From<&str> for Subquery {
    fn from(sql: &str) -> Self {
        Subquery::Raw(sql.to_string())
    }
}

impl From<String> for Subquery {
    fn from(sql: String) -> Self {
        Subquery::Raw(sql)
    }
}
