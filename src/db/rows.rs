//! Row-to-JSON conversion.
//!
//! Decodes a `PgRow` into an ordered column -> value map by classifying the
//! column's declared type name. NUMERIC values are rendered as strings via
//! `BigDecimal` to preserve the exact database representation; timestamps are
//! rendered as RFC 3339 text; values that fail to decode become null.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};

/// Convert a row to an ordered JSON map, preserving column order.
pub fn row_to_json(row: &PgRow) -> serde_json::Map<String, JsonValue> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let type_name = col.type_info().name();
            (col.name().to_string(), decode_value(row, idx, type_name))
        })
        .collect()
}

fn decode_value(row: &PgRow, idx: usize, type_name: &str) -> JsonValue {
    match type_name {
        "INT2" => decode_with(row, idx, |v: i16| JsonValue::from(v)),
        "INT4" => decode_with(row, idx, |v: i32| JsonValue::from(v)),
        "INT8" => decode_with(row, idx, |v: i64| JsonValue::from(v)),
        "FLOAT4" => decode_with(row, idx, |v: f32| JsonValue::from(v)),
        "FLOAT8" => decode_with(row, idx, |v: f64| JsonValue::from(v)),
        "NUMERIC" => decode_with(row, idx, |v: BigDecimal| JsonValue::String(v.to_string())),
        "BOOL" => decode_with(row, idx, JsonValue::Bool),
        "JSON" | "JSONB" => decode_with(row, idx, |v: JsonValue| v),
        "TIMESTAMPTZ" => decode_with(row, idx, |v: DateTime<Utc>| {
            JsonValue::String(v.to_rfc3339())
        }),
        "TIMESTAMP" => decode_with(row, idx, |v: NaiveDateTime| {
            JsonValue::String(v.and_utc().to_rfc3339())
        }),
        "DATE" => decode_with(row, idx, |v: NaiveDate| JsonValue::String(v.to_string())),
        "BYTEA" => decode_with(row, idx, |v: Vec<u8>| {
            use base64::{Engine as _, engine::general_purpose::STANDARD};
            JsonValue::String(STANDARD.encode(v))
        }),
        // TEXT, VARCHAR, BPCHAR, NAME, and anything unrecognized: best-effort text.
        _ => decode_with(row, idx, JsonValue::String),
    }
}

/// Decode one nullable column, mapping decode failures to null.
fn decode_with<'r, T, F>(row: &'r PgRow, idx: usize, to_json: F) -> JsonValue
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    F: FnOnce(T) -> JsonValue,
{
    match row.try_get::<Option<T>, _>(idx) {
        Ok(Some(value)) => to_json(value),
        Ok(None) => JsonValue::Null,
        Err(_) => JsonValue::Null,
    }
}
