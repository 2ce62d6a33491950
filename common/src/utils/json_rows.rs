//! PostgreSQL execution with JSON in and JSON out.
//!
//! Arguments arrive as JSON values and are bound positionally; results are
//! returned as a JSON array of row objects. Row queries are aggregated by
//! the server (`jsonb_agg(to_jsonb(t))`) so every column type survives the
//! trip; other statements are decoded column by column.

use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{Column, Executor, Postgres, Row, TypeInfo, ValueRef};

use crate::errors::AppResult;
use crate::utils::SqlValidator;

/// Binds JSON values to `$1..$n` in order.
///
/// Arrays of strings bind as `text[]`, other arrays and objects as `jsonb`.
pub fn bind_json_args<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    args: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    for arg in args {
        query = match arg {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => query.bind(s.clone()),
            Value::Array(items) if items.iter().all(Value::is_string) => query.bind(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect::<Vec<String>>(),
            ),
            other => query.bind(Json(other.clone())),
        };
    }
    query
}

/// Executes a statement and returns its rows as a JSON array of objects.
///
/// Statements that produce no rows yield `[]`.
pub async fn fetch_json_rows<'c, E>(executor: E, sql: &str, args: &[Value]) -> AppResult<Value>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = SqlValidator::strip_terminator(sql);

    if SqlValidator::is_row_query(sql) {
        let wrapped =
            format!("SELECT COALESCE(jsonb_agg(to_jsonb(t)), '[]'::jsonb) FROM (\n{sql}\n) AS t");
        let row = bind_json_args(sqlx::query(&wrapped), args)
            .fetch_one(executor)
            .await?;
        let rows: Value = row.try_get(0)?;
        return Ok(rows);
    }

    let rows = bind_json_args(sqlx::query(sql), args)
        .fetch_all(executor)
        .await?;
    Ok(Value::Array(rows.iter().map(row_to_json).collect()))
}

fn row_to_json(row: &PgRow) -> Value {
    let mut object = Map::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name());
        object.insert(column.name().to_string(), value);
    }
    Value::Object(object)
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> Value {
    match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Err(_) => return Value::Null,
        Ok(_) => {}
    }

    let decoded = match type_name {
        "BOOL" => row.try_get::<bool, _>(idx).map(Value::from),
        "INT2" => row.try_get::<i16, _>(idx).map(Value::from),
        "INT4" => row.try_get::<i32, _>(idx).map(Value::from),
        "INT8" => row.try_get::<i64, _>(idx).map(Value::from),
        "FLOAT4" => row.try_get::<f32, _>(idx).map(|v| Value::from(f64::from(v))),
        "FLOAT8" => row.try_get::<f64, _>(idx).map(Value::from),
        "JSON" | "JSONB" => row.try_get::<Value, _>(idx),
        "UUID" => row
            .try_get::<uuid::Uuid, _>(idx)
            .map(|v| Value::String(v.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(idx)
            .map(|v| Value::String(v.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<chrono::NaiveDateTime, _>(idx)
            .map(|v| Value::String(v.to_string())),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(idx)
            .map(|v| Value::String(v.to_string())),
        "TEXT[]" | "VARCHAR[]" | "NAME[]" => row.try_get::<Vec<String>, _>(idx).map(Value::from),
        _ => row.try_get::<String, _>(idx).map(Value::String),
    };

    decoded.unwrap_or_else(|e| {
        tracing::debug!(column = idx, type_name, error = %e, "Column not decodable, returning null");
        Value::Null
    })
}
