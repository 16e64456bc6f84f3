//! PostgreSQL engine adapter over `tokio-postgres`.
//!
//! The wire protocol only knows positional `$n` placeholders, so the adapter
//! rewrites the compiled `:name` form at bind time: each placeholder
//! occurrence becomes the next `$n` and its value is appended to the bind
//! list in order. String literals are skipped and `::type` casts are left
//! alone.

use std::collections::BTreeMap;

use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::NoTls;

use crate::engine::{Engine, EngineError, Row};
use crate::error::{DbError, DbResult};
use crate::value::Value;

/// [`Engine`] implementation backed by a `tokio_postgres::Client`.
pub struct PgEngine {
    client: tokio_postgres::Client,
}

impl PgEngine {
    /// Wrap an already-connected client.
    pub fn new(client: tokio_postgres::Client) -> Self {
        Self { client }
    }

    /// Connect with `NoTls` and drive the connection on a background task.
    pub async fn connect(config: &str) -> DbResult<Self> {
        let (client, connection) = tokio_postgres::connect(config, NoTls)
            .await
            .map_err(|e| DbError::query(e.to_string(), None))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "postgres connection closed");
            }
        });

        Ok(Self { client })
    }
}

impl Engine for PgEngine {
    async fn fetch_all(
        &self,
        sql: &str,
        params: &[(String, Value)],
    ) -> Result<Vec<Row>, EngineError> {
        let (sql, values) = rebind_named(sql, params)?;
        let boxed = box_values(&values);
        let refs = as_tosql_refs(&boxed);

        let rows = self
            .client
            .query(sql.as_str(), &refs)
            .await
            .map_err(engine_error)?;
        Ok(rows.iter().map(row_to_map).collect())
    }

    async fn fetch_one(
        &self,
        sql: &str,
        params: &[(String, Value)],
    ) -> Result<Option<Row>, EngineError> {
        let (sql, values) = rebind_named(sql, params)?;
        let boxed = box_values(&values);
        let refs = as_tosql_refs(&boxed);

        let rows = self
            .client
            .query(sql.as_str(), &refs)
            .await
            .map_err(engine_error)?;
        Ok(rows.first().map(row_to_map))
    }

    async fn execute(&self, sql: &str, params: &[(String, Value)]) -> Result<u64, EngineError> {
        let (sql, values) = rebind_named(sql, params)?;
        let boxed = box_values(&values);
        let refs = as_tosql_refs(&boxed);

        self.client
            .execute(sql.as_str(), &refs)
            .await
            .map_err(engine_error)
    }

    async fn exec(&self, sql: &str) -> Result<(), EngineError> {
        self.client.batch_execute(sql).await.map_err(engine_error)
    }

    async fn last_insert_id(&self) -> Result<String, EngineError> {
        let row = self
            .client
            .query_one("SELECT LASTVAL()", &[])
            .await
            .map_err(engine_error)?;
        let id: i64 = row.try_get(0).map_err(engine_error)?;
        Ok(id.to_string())
    }
}

fn engine_error(e: tokio_postgres::Error) -> EngineError {
    let code = e.code().map(|c| c.code().to_string());
    EngineError::new(e.to_string(), code)
}

/// Rewrite `:name` placeholders to `$1..$n` and collect the bind order.
///
/// A repeated name binds its value again under a new index. Content inside
/// single-quoted literals is left untouched, as is the `::` cast operator.
fn rebind_named<'a>(
    sql: &str,
    params: &'a [(String, Value)],
) -> Result<(String, Vec<&'a Value>), EngineError> {
    let mut out = String::with_capacity(sql.len());
    let mut values: Vec<&'a Value> = Vec::new();
    let mut chars = sql.char_indices().peekable();
    let mut in_string = false;

    while let Some((_, ch)) = chars.next() {
        if in_string {
            out.push(ch);
            if ch == '\'' {
                // Either the closing quote or the first half of an escaped ''.
                if chars.peek().is_some_and(|&(_, next)| next == '\'') {
                    let (_, next) = chars.next().unwrap();
                    out.push(next);
                } else {
                    in_string = false;
                }
            }
            continue;
        }

        match ch {
            '\'' => {
                in_string = true;
                out.push(ch);
            }
            ':' => {
                // `::` is a cast, not a placeholder.
                if chars.peek().is_some_and(|&(_, next)| next == ':') {
                    let (_, next) = chars.next().unwrap();
                    out.push(ch);
                    out.push(next);
                    continue;
                }

                let mut name = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if next == '_' || next.is_ascii_alphanumeric() {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }

                if name.is_empty() {
                    out.push(ch);
                    continue;
                }

                let value = params
                    .iter()
                    .find(|(k, _)| k.trim_start_matches(':') == name)
                    .map(|(_, v)| v)
                    .ok_or_else(|| {
                        EngineError::new(format!("Missing parameter for placeholder ':{name}'"), None)
                    })?;

                values.push(value);
                out.push('$');
                out.push_str(&values.len().to_string());
            }
            _ => out.push(ch),
        }
    }

    Ok((out, values))
}

fn box_values(values: &[&Value]) -> Vec<Box<dyn ToSql + Sync + Send>> {
    values
        .iter()
        .map(|v| -> Box<dyn ToSql + Sync + Send> {
            match v {
                Value::Null => Box::new(Option::<String>::None),
                Value::Bool(b) => Box::new(*b),
                Value::Int(i) => Box::new(*i),
                Value::Float(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.clone()),
                Value::Timestamp(ts) => Box::new(*ts),
                Value::Json(j) => Box::new(j.clone()),
            }
        })
        .collect()
}

fn as_tosql_refs(boxed: &[Box<dyn ToSql + Sync + Send>]) -> Vec<&(dyn ToSql + Sync)> {
    boxed
        .iter()
        .map(|b| b.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

/// Materialize a result row into the portable column → [`Value`] map.
///
/// Covers the scalar types the compiler can produce; anything else is read
/// as text where the driver allows it and otherwise surfaces as NULL.
fn row_to_map(row: &tokio_postgres::Row) -> Row {
    let mut out = BTreeMap::new();
    for (i, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), column_value(row, i, column.type_()));
    }
    out
}

fn column_value(row: &tokio_postgres::Row, idx: usize, ty: &Type) -> Value {
    if *ty == Type::BOOL {
        opt(row.try_get::<_, Option<bool>>(idx)).map_or(Value::Null, Value::Bool)
    } else if *ty == Type::INT2 {
        opt(row.try_get::<_, Option<i16>>(idx)).map_or(Value::Null, |v| Value::Int(v as i64))
    } else if *ty == Type::INT4 {
        opt(row.try_get::<_, Option<i32>>(idx)).map_or(Value::Null, |v| Value::Int(v as i64))
    } else if *ty == Type::INT8 {
        opt(row.try_get::<_, Option<i64>>(idx)).map_or(Value::Null, Value::Int)
    } else if *ty == Type::FLOAT4 {
        opt(row.try_get::<_, Option<f32>>(idx)).map_or(Value::Null, |v| Value::Float(v as f64))
    } else if *ty == Type::FLOAT8 {
        opt(row.try_get::<_, Option<f64>>(idx)).map_or(Value::Null, Value::Float)
    } else if *ty == Type::TIMESTAMP {
        opt(row.try_get::<_, Option<chrono::NaiveDateTime>>(idx))
            .map_or(Value::Null, |v| Value::Timestamp(v.and_utc()))
    } else if *ty == Type::TIMESTAMPTZ {
        opt(row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx))
            .map_or(Value::Null, Value::Timestamp)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        opt(row.try_get::<_, Option<serde_json::Value>>(idx)).map_or(Value::Null, Value::Json)
    } else {
        opt(row.try_get::<_, Option<String>>(idx)).map_or(Value::Null, Value::Text)
    }
}

fn opt<T>(result: Result<Option<T>, tokio_postgres::Error>) -> Option<T> {
    result.ok().flatten()
}
