//! Generated-placeholder condition fragments shared by the builders.
//!
//! IN, LIKE and BETWEEN helpers mint placeholder names from the builder's
//! monotonically increasing counter (`in_<n>`, `like_<n>`, `between_<n>`),
//! so generated names never collide within one statement. The counter is
//! never reset mid-compilation.

use crate::params::Params;
use crate::value::Value;

/// `column IN (:in_1, :in_2, ...)` or the empty-list literal.
///
/// An empty value list compiles to `1 = 0` (always false) and an empty NOT IN
/// to `1 = 1` (always true) instead of invalid empty-parenthesis SQL. This is
/// a deliberate edge-case policy: a dynamically-built filter list that
/// happens to be empty silently flips the clause to a constant.
pub(crate) fn in_clause(
    counter: &mut u32,
    column: &str,
    values: Vec<Value>,
    not: bool,
) -> Option<(String, Params)> {
    let column = column.trim();
    if column.is_empty() {
        return None;
    }

    if values.is_empty() {
        let sql = if not { "1 = 1" } else { "1 = 0" };
        return Some((sql.to_string(), Params::new()));
    }

    let mut params = Params::new();
    let mut placeholders: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        *counter += 1;
        let name = format!("in_{counter}");
        placeholders.push(format!(":{name}"));
        params.insert(name, value);
    }

    let op = if not { "NOT IN" } else { "IN" };
    let sql = format!("{column} {op} ({})", placeholders.join(", "));
    Some((sql, params))
}

/// `column [NOT] LIKE :like_<n>`
pub(crate) fn like_clause(
    counter: &mut u32,
    column: &str,
    pattern: impl Into<Value>,
    not: bool,
) -> Option<(String, Params)> {
    let column = column.trim();
    if column.is_empty() {
        return None;
    }

    *counter += 1;
    let name = format!("like_{counter}");
    let op = if not { "NOT LIKE" } else { "LIKE" };
    let sql = format!("{column} {op} :{name}");

    let mut params = Params::new();
    params.insert(name, pattern);
    Some((sql, params))
}

/// `column [NOT] BETWEEN :between_<n> AND :between_<n+1>`
pub(crate) fn between_clause(
    counter: &mut u32,
    column: &str,
    from: impl Into<Value>,
    to: impl Into<Value>,
    not: bool,
) -> Option<(String, Params)> {
    let column = column.trim();
    if column.is_empty() {
        return None;
    }

    *counter += 1;
    let low = format!("between_{counter}");
    *counter += 1;
    let high = format!("between_{counter}");

    let op = if not { "NOT BETWEEN" } else { "BETWEEN" };
    let sql = format!("{column} {op} :{low} AND :{high}");

    let mut params = Params::new();
    params.insert(low, from);
    params.insert(high, to);
    Some((sql, params))
}

/// Implements the boolean-composition API for a builder owning a
/// `where_tree`, a `param_counter` and a `ctx`.
///
/// Every method forwards to the builder's condition tree; subquery-accepting
/// methods lower their argument through [`Subquery`](super::Subquery) first.
macro_rules! impl_where_api {
    ($builder:ty) => {
        impl $builder {
            /// Add a WHERE condition joined with AND.
            ///
            /// The fragment is raw SQL with named placeholders; bare column
            /// references in it are quoted heuristically at compile time.
            pub fn and_where(mut self, sql: &str, params: $crate::Params) -> Self {
                self.where_tree
                    .push_leaf($crate::condition::Connector::And, sql, params);
                self
            }

            /// Add a WHERE condition joined with OR.
            pub fn or_where(mut self, sql: &str, params: $crate::Params) -> Self {
                self.where_tree
                    .push_leaf($crate::condition::Connector::Or, sql, params);
                self
            }

            /// Group conditions in parentheses, joined to the tree with AND.
            ///
            /// ```ignore
            /// q.and_where("active = 1", params! {})
            ///     .and_where_group(|q| {
            ///         q.and_where("age > :age", params! { "age" => 30 })
            ///             .or_where("phone = :phone", params! { "phone" => "+1" })
            ///     });
            /// ```
            pub fn and_where_group(mut self, f: impl FnOnce(Self) -> Self) -> Self {
                self.where_tree.begin_group($crate::condition::Connector::And);
                let mut this = f(self);
                this.where_tree.end_group();
                this
            }

            /// Group conditions in parentheses, joined to the tree with OR.
            pub fn or_where_group(mut self, f: impl FnOnce(Self) -> Self) -> Self {
                self.where_tree.begin_group($crate::condition::Connector::Or);
                let mut this = f(self);
                this.where_tree.end_group();
                this
            }

            pub fn where_null(self, column: &str) -> Self {
                let column = column.trim();
                if column.is_empty() {
                    return self;
                }
                self.and_where(&format!("{column} IS NULL"), $crate::Params::new())
            }

            pub fn where_not_null(self, column: &str) -> Self {
                let column = column.trim();
                if column.is_empty() {
                    return self;
                }
                self.and_where(&format!("{column} IS NOT NULL"), $crate::Params::new())
            }

            /// `column IN (..)`; an empty list compiles to always-false.
            pub fn where_in<V: Into<$crate::Value>>(
                self,
                column: &str,
                values: impl IntoIterator<Item = V>,
            ) -> Self {
                self.where_in_internal($crate::condition::Connector::And, column, values, false)
            }

            pub fn or_where_in<V: Into<$crate::Value>>(
                self,
                column: &str,
                values: impl IntoIterator<Item = V>,
            ) -> Self {
                self.where_in_internal($crate::condition::Connector::Or, column, values, false)
            }

            /// `column NOT IN (..)`; an empty list compiles to always-true.
            pub fn where_not_in<V: Into<$crate::Value>>(
                self,
                column: &str,
                values: impl IntoIterator<Item = V>,
            ) -> Self {
                self.where_in_internal($crate::condition::Connector::And, column, values, true)
            }

            pub fn or_where_not_in<V: Into<$crate::Value>>(
                self,
                column: &str,
                values: impl IntoIterator<Item = V>,
            ) -> Self {
                self.where_in_internal($crate::condition::Connector::Or, column, values, true)
            }

            fn where_in_internal<V: Into<$crate::Value>>(
                mut self,
                connector: $crate::condition::Connector,
                column: &str,
                values: impl IntoIterator<Item = V>,
                not: bool,
            ) -> Self {
                let values: Vec<$crate::Value> = values.into_iter().map(Into::into).collect();
                if let Some((sql, params)) =
                    $crate::qb::clauses::in_clause(&mut self.param_counter, column, values, not)
                {
                    self.where_tree.push_leaf(connector, sql, params);
                }
                self
            }

            pub fn where_like(self, column: &str, pattern: &str) -> Self {
                self.where_like_internal($crate::condition::Connector::And, column, pattern, false)
            }

            pub fn or_where_like(self, column: &str, pattern: &str) -> Self {
                self.where_like_internal($crate::condition::Connector::Or, column, pattern, false)
            }

            pub fn where_not_like(self, column: &str, pattern: &str) -> Self {
                self.where_like_internal($crate::condition::Connector::And, column, pattern, true)
            }

            pub fn or_where_not_like(self, column: &str, pattern: &str) -> Self {
                self.where_like_internal($crate::condition::Connector::Or, column, pattern, true)
            }

            fn where_like_internal(
                mut self,
                connector: $crate::condition::Connector,
                column: &str,
                pattern: &str,
                not: bool,
            ) -> Self {
                if let Some((sql, params)) =
                    $crate::qb::clauses::like_clause(&mut self.param_counter, column, pattern, not)
                {
                    self.where_tree.push_leaf(connector, sql, params);
                }
                self
            }

            pub fn where_between<V: Into<$crate::Value>>(self, column: &str, from: V, to: V) -> Self {
                self.where_between_internal($crate::condition::Connector::And, column, from, to, false)
            }

            pub fn or_where_between<V: Into<$crate::Value>>(self, column: &str, from: V, to: V) -> Self {
                self.where_between_internal($crate::condition::Connector::Or, column, from, to, false)
            }

            pub fn where_not_between<V: Into<$crate::Value>>(self, column: &str, from: V, to: V) -> Self {
                self.where_between_internal($crate::condition::Connector::And, column, from, to, true)
            }

            pub fn or_where_not_between<V: Into<$crate::Value>>(self, column: &str, from: V, to: V) -> Self {
                self.where_between_internal($crate::condition::Connector::Or, column, from, to, true)
            }

            fn where_between_internal<V: Into<$crate::Value>>(
                mut self,
                connector: $crate::condition::Connector,
                column: &str,
                from: V,
                to: V,
                not: bool,
            ) -> Self {
                if let Some((sql, params)) = $crate::qb::clauses::between_clause(
                    &mut self.param_counter,
                    column,
                    from,
                    to,
                    not,
                ) {
                    self.where_tree.push_leaf(connector, sql, params);
                }
                self
            }

            /// `column IN (<subquery>)`.
            ///
            /// The subquery may be a finished builder, raw SQL, or a
            /// composition closure; see [`Subquery`](crate::Subquery).
            pub fn where_in_subquery(
                self,
                column: &str,
                subquery: impl Into<$crate::Subquery>,
            ) -> Self {
                self.where_in_subquery_internal(
                    $crate::condition::Connector::And,
                    column,
                    subquery.into(),
                    false,
                )
            }

            pub fn or_where_in_subquery(
                self,
                column: &str,
                subquery: impl Into<$crate::Subquery>,
            ) -> Self {
                self.where_in_subquery_internal(
                    $crate::condition::Connector::Or,
                    column,
                    subquery.into(),
                    false,
                )
            }

            pub fn where_not_in_subquery(
                self,
                column: &str,
                subquery: impl Into<$crate::Subquery>,
            ) -> Self {
                self.where_in_subquery_internal(
                    $crate::condition::Connector::And,
                    column,
                    subquery.into(),
                    true,
                )
            }

            pub fn or_where_not_in_subquery(
                self,
                column: &str,
                subquery: impl Into<$crate::Subquery>,
            ) -> Self {
                self.where_in_subquery_internal(
                    $crate::condition::Connector::Or,
                    column,
                    subquery.into(),
                    true,
                )
            }

            fn where_in_subquery_internal(
                mut self,
                connector: $crate::condition::Connector,
                column: &str,
                subquery: $crate::Subquery,
                not: bool,
            ) -> Self {
                let column = column.trim().to_string();
                if column.is_empty() {
                    return self;
                }

                let compiled = subquery.lower(&self.ctx);
                let sub_sql = compiled.sql.trim();
                if sub_sql.is_empty() {
                    return self;
                }

                let op = if not { "NOT IN" } else { "IN" };
                let sql = format!("{column} {op} ({sub_sql})");
                self.where_tree.push_leaf(connector, sql, compiled.params);
                self
            }

            /// `[NOT] EXISTS (<subquery>)`.
            pub fn where_exists(self, subquery: impl Into<$crate::Subquery>) -> Self {
                self.where_exists_internal($crate::condition::Connector::And, subquery.into(), false)
            }

            pub fn or_where_exists(self, subquery: impl Into<$crate::Subquery>) -> Self {
                self.where_exists_internal($crate::condition::Connector::Or, subquery.into(), false)
            }

            pub fn where_not_exists(self, subquery: impl Into<$crate::Subquery>) -> Self {
                self.where_exists_internal($crate::condition::Connector::And, subquery.into(), true)
            }

            pub fn or_where_not_exists(self, subquery: impl Into<$crate::Subquery>) -> Self {
                self.where_exists_internal($crate::condition::Connector::Or, subquery.into(), true)
            }

            fn where_exists_internal(
                mut self,
                connector: $crate::condition::Connector,
                subquery: $crate::Subquery,
                not: bool,
            ) -> Self {
                let compiled = subquery.lower(&self.ctx);
                let sub_sql = compiled.sql.trim();
                if sub_sql.is_empty() {
                    return self;
                }

                let prefix = if not { "NOT " } else { "" };
                let sql = format!("{prefix}EXISTS ({sub_sql})");
                self.where_tree.push_leaf(connector, sql, compiled.params);
                self
            }

            /// WHERE tree snapshot, read by the compiler.
            pub fn where_nodes(&self) -> &[$crate::condition::ConditionNode] {
                self.where_tree.nodes()
            }
        }
    };
}

pub(crate) use impl_where_api;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn in_clause_names_follow_counter() {
        let mut counter = 0;
        let (sql, params) = in_clause(
            &mut counter,
            "id",
            vec![Value::Int(1), Value::Int(2), Value::Int(3)],
            false,
        )
        .unwrap();
        assert_eq!(sql, "id IN (:in_1, :in_2, :in_3)");
        assert_eq!(params.get("in_2"), Some(&Value::Int(2)));
        assert_eq!(counter, 3);
    }

    #[test]
    fn in_clause_empty_lists() {
        let mut counter = 0;
        let (sql, params) = in_clause(&mut counter, "id", vec![], false).unwrap();
        assert_eq!(sql, "1 = 0");
        assert!(params.is_empty());

        let (sql, _) = in_clause(&mut counter, "id", vec![], true).unwrap();
        assert_eq!(sql, "1 = 1");
        assert_eq!(counter, 0);
    }

    #[test]
    fn between_clause_uses_adjacent_counters() {
        let mut counter = 4;
        let (sql, params) =
            between_clause(&mut counter, "age", Value::Int(18), Value::Int(65), false).unwrap();
        assert_eq!(sql, "age BETWEEN :between_5 AND :between_6");
        assert_eq!(params.get("between_5"), Some(&Value::Int(18)));
        assert_eq!(params.get("between_6"), Some(&Value::Int(65)));
    }

    #[test]
    fn like_clause_not_variant() {
        let mut counter = 0;
        let (sql, _) = like_clause(&mut counter, "name", "%a%", true).unwrap();
        assert_eq!(sql, "name NOT LIKE :like_1");
    }

    #[test]
    fn blank_column_is_rejected() {
        let mut counter = 0;
        assert!(in_clause(&mut counter, "  ", vec![Value::Int(1)], false).is_none());
        assert!(like_clause(&mut counter, "", "x", false).is_none());
    }
}
