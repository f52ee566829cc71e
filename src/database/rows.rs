//! Row to JSON conversion for ad-hoc tenant queries

use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row};

/// Convert rows into JSON objects keyed by column name
pub fn rows_to_json(rows: Vec<PgRow>) -> Vec<Map<String, Value>> {
    rows.iter().map(row_to_json).collect()
}

pub fn row_to_json(row: &PgRow) -> Map<String, Value> {
    let mut map = Map::new();

    for i in 0..row.len() {
        let column_name = row.column(i).name();
        let value: Result<Option<Value>, _> = row.try_get(i);

        let json_value = match value {
            Ok(Some(v)) => v,
            Ok(None) => Value::Null,
            Err(_) => column_fallback(row, i),
        };

        map.insert(column_name.to_string(), json_value);
    }
    map
}

// Columns that are not json/jsonb are decoded by trying the common scalar types
fn column_fallback(row: &PgRow, i: usize) -> Value {
    if let Ok(s) = row.try_get::<Option<String>, _>(i) {
        return s.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
        return v.map(|v| Value::Number(v.into())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(i) {
        return v.map(|v| Value::Number(v.into())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(i) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(i) {
        return v.map(|v| Value::String(v.to_rfc3339())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(i) {
        return v.map(|v| Value::String(v.to_string())).unwrap_or(Value::Null);
    }
    Value::Null
}
