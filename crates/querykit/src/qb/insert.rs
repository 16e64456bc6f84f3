//! INSERT query builder.

use crate::compiler::CompiledQuery;
use crate::connection::Connection;
use crate::engine::Engine;
use crate::error::DbResult;
use crate::qb::BuilderContext;
use crate::value::Value;

/// INSERT query builder.
///
/// Column values compile to fresh `:v_<n>` placeholders in insertion order.
/// Inserting with no columns compiles to `INSERT INTO t DEFAULT VALUES`.
#[derive(Clone, Debug)]
pub struct InsertBuilder {
    ctx: BuilderContext,
    table: String,
    data: Vec<(String, Value)>,
}

impl InsertBuilder {
    pub(crate) fn new(ctx: BuilderContext, table: &str) -> Self {
        let table = ctx.apply_prefix(table);
        Self {
            ctx,
            table,
            data: Vec::new(),
        }
    }

    /// Set one column value, replacing an earlier value for the same column.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        let column = column.trim();
        if column.is_empty() {
            return self;
        }

        let value = value.into();
        if let Some(entry) = self.data.iter_mut().find(|(c, _)| c == column) {
            entry.1 = value;
        } else {
            self.data.push((column.to_string(), value));
        }
        self
    }

    /// Replace the whole column/value map.
    pub fn values(mut self, data: Vec<(&str, Value)>) -> Self {
        self.data = data
            .into_iter()
            .filter_map(|(c, v)| {
                let c = c.trim();
                if c.is_empty() { None } else { Some((c.to_string(), v)) }
            })
            .collect();
        self
    }

    /// Render the statement for this builder's dialect.
    pub fn compile(&self) -> CompiledQuery {
        self.ctx.compiler().compile_insert(self)
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

    pub fn data(&self) -> &[(String, Value)] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::qb::QueryFactory;

    fn query() -> QueryFactory {
        QueryFactory::new(Dialect::Postgres)
    }

    #[test]
    fn insert_generates_value_placeholders() {
        let compiled = query()
            .insert("users")
            .set("name", "Alice")
            .set("age", 30)
            .compile();
        assert_eq!(
            compiled.sql,
            r#"INSERT INTO "users" ("name", "age") VALUES (:v_1, :v_2)"#
        );
        assert_eq!(compiled.params.get("v_1"), Some(&Value::Text("Alice".to_string())));
        assert_eq!(compiled.params.get("v_2"), Some(&Value::Int(30)));
    }

    #[test]
    fn insert_empty_data_is_default_values() {
        let compiled = query().insert("events").compile();
        assert_eq!(compiled.sql, r#"INSERT INTO "events" DEFAULT VALUES"#);
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn insert_applies_prefix() {
        let compiled = QueryFactory::with_prefix(Dialect::Postgres, "t_")
            .insert("users")
            .set("name", "Bob")
            .compile();
        assert!(compiled.sql.starts_with(r#"INSERT INTO "t_users""#));
    }

    #[test]
    fn set_replaces_same_column() {
        let compiled = query()
            .insert("users")
            .set("name", "Alice")
            .set("name", "Bob")
            .compile();
        assert_eq!(compiled.params.len(), 1);
        assert_eq!(compiled.params.get("v_1"), Some(&Value::Text("Bob".to_string())));
    }

    #[test]
    fn values_replaces_map() {
        let compiled = query()
            .insert("users")
            .set("name", "Alice")
            .values(vec![("email", Value::Text("a@b.c".into()))])
            .compile();
        assert_eq!(
            compiled.sql,
            r#"INSERT INTO "users" ("email") VALUES (:v_1)"#
        );
    }

    #[test]
    fn backtick_dialect_quotes_columns() {
        let compiled = QueryFactory::new(Dialect::MariaDb)
            .insert("users")
            .set("name", "Alice")
            .compile();
        assert_eq!(compiled.sql, "INSERT INTO `users` (`name`) VALUES (:v_1)");
    }
}
