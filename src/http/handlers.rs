//! Resource handlers.
//!
//! Each handler is a thin composition: check the table binding (unbound
//! tables short-circuit with a soft table-not-found payload, no query runs),
//! build the query from the fixed column constants, delegate to the resilient
//! executor, and shape the response envelope.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::info;

use crate::db::schema::{
    CONTRACT_ADDRESS_COLUMN, DENOM_COLUMN, DISPLAY_AMOUNT_COLUMN, POOL_MATRIX_TABLE,
    PRICE_TICKS_TABLE, RECENT_SWAPS_TABLE, TOKEN_HOLDERS_TABLE, TOTAL_LIQUIDITY_COLUMN,
};
use crate::error::ApiError;
use crate::http::AppState;
use crate::models::QueryRequest;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PoolsParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub top: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct HoldersParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub filter: Option<String>,
}

/// `GET /` liveness probe.
pub async fn root() -> Json<JsonValue> {
    Json(json!({ "message": "Dex API is running" }))
}

/// `GET /api/v1/pools` - list pools, paginated; `top=N` switches to a full
/// scan ordered descending by liquidity, ignoring limit/offset.
pub async fn list_pools(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PoolsParams>,
) -> Response {
    let Some(table) = state.tables.pools.as_ref() else {
        return ApiError::schema_unavailable(POOL_MATRIX_TABLE).into_response();
    };

    let mut request = QueryRequest::new(table.name()).with_page(params.limit, params.offset);
    if let Some(top) = params.top.filter(|t| *t > 0) {
        request = request.with_top(top, TOTAL_LIQUIDITY_COLUMN);
    }

    match state.executor.fetch(&state.pool, &request).await {
        Ok(outcome) => {
            info!(
                count = outcome.row_count(),
                execution_time = %outcome.execution_time(),
                "Fetched pools"
            );
            Json(json!({
                "pools": outcome.rows,
                "count": outcome.row_count(),
                "execution_time": outcome.execution_time(),
            }))
            .into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// `GET /api/v1/pool/{address}` - single pool by contract address. Zero
/// matches is a soft "Pool not found" message; one match comes back unwrapped.
pub async fn get_pool(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Response {
    let Some(table) = state.tables.pools.as_ref() else {
        return ApiError::schema_unavailable(POOL_MATRIX_TABLE).into_response();
    };

    let request = pool_lookup_request(table.name(), address);

    match state.executor.fetch(&state.pool, &request).await {
        Ok(outcome) => {
            let execution_time = outcome.execution_time();
            match outcome.rows.into_iter().next() {
                Some(pool) => Json(json!({
                    "pool": pool,
                    "execution_time": execution_time,
                }))
                .into_response(),
                None => ApiError::not_found("Pool").into_response(),
            }
        }
        Err(err) => err.into_response(),
    }
}

/// `GET /api/v1/pool/transactions/{address}` - swap transactions for a pool.
pub async fn list_pool_transactions(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(params): Query<PageParams>,
) -> Response {
    let Some(table) = state.tables.swaps.as_ref() else {
        return ApiError::schema_unavailable(RECENT_SWAPS_TABLE).into_response();
    };

    let request = QueryRequest::new(table.name())
        .with_filter(CONTRACT_ADDRESS_COLUMN, address)
        .with_page(params.limit, params.offset);

    match state.executor.fetch(&state.pool, &request).await {
        Ok(outcome) => Json(json!({
            "transactions": outcome.rows,
            "count": outcome.row_count(),
            "execution_time": outcome.execution_time(),
        }))
        .into_response(),
        Err(err) => err.into_response(),
    }
}

/// `GET /api/v1/denom/holders/{denomaddress}` - holders of a denom.
/// `filter=top` (the default) sorts the fetched page in memory descending by
/// display amount; this is a page-local sort, not a database order-by.
pub async fn list_denom_holders(
    State(state): State<Arc<AppState>>,
    Path(denom): Path<String>,
    Query(params): Query<HoldersParams>,
) -> Response {
    let Some(table) = state.tables.holders.as_ref() else {
        return ApiError::schema_unavailable(TOKEN_HOLDERS_TABLE).into_response();
    };

    let request = QueryRequest::new(table.name())
        .with_filter(DENOM_COLUMN, denom)
        .with_page(params.limit, params.offset);

    match state.executor.fetch(&state.pool, &request).await {
        Ok(mut outcome) => {
            if params.filter.as_deref().unwrap_or("top") == "top" {
                sort_page_descending(&mut outcome.rows, DISPLAY_AMOUNT_COLUMN);
            }
            Json(json!({
                "holders": outcome.rows,
                "count": outcome.row_count(),
                "execution_time": outcome.execution_time(),
            }))
            .into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// `GET /api/v1/pool/ticker/{contractaddress}` - price ticks for a pool.
/// The envelope key is "pool", kept from the original surface.
pub async fn list_pool_ticks(
    State(state): State<Arc<AppState>>,
    Path(contract_address): Path<String>,
    Query(params): Query<PageParams>,
) -> Response {
    let Some(table) = state.tables.ticks.as_ref() else {
        return ApiError::schema_unavailable(PRICE_TICKS_TABLE).into_response();
    };

    let request = QueryRequest::new(table.name())
        .with_filter(CONTRACT_ADDRESS_COLUMN, contract_address)
        .with_page(params.limit, params.offset);

    match state.executor.fetch(&state.pool, &request).await {
        Ok(outcome) => Json(json!({
            "pool": outcome.rows,
            "count": outcome.row_count(),
            "execution_time": outcome.execution_time(),
        }))
        .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Build the single-pool lookup. Exactly one match is expected; LIMIT 1
/// keeps a table with duplicate addresses from being fetched wholesale.
fn pool_lookup_request(table: &'static str, address: String) -> QueryRequest {
    QueryRequest::new(table)
        .with_filter(CONTRACT_ADDRESS_COLUMN, address)
        .with_page(Some(1), None)
}

/// Sort an already-fetched page descending by a numeric column. Values may be
/// JSON numbers or numeric strings (NUMERIC columns decode to strings); rows
/// with a missing or unparsable value sort last.
pub fn sort_page_descending(rows: &mut [serde_json::Map<String, JsonValue>], column: &str) {
    fn numeric_value(row: &serde_json::Map<String, JsonValue>, column: &str) -> f64 {
        match row.get(column) {
            Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(f64::NEG_INFINITY),
            Some(JsonValue::String(s)) => s.parse().unwrap_or(f64::NEG_INFINITY),
            _ => f64::NEG_INFINITY,
        }
    }

    rows.sort_by(|a, b| numeric_value(b, column).total_cmp(&numeric_value(a, column)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder(address: &str, amount: JsonValue) -> serde_json::Map<String, JsonValue> {
        let mut row = serde_json::Map::new();
        row.insert("address".to_string(), json!(address));
        row.insert(DISPLAY_AMOUNT_COLUMN.to_string(), amount);
        row
    }

    #[test]
    fn test_pool_lookup_fetches_at_most_one_row() {
        let request = pool_lookup_request("pool_matrix", "zig1abc".to_string());
        assert_eq!(
            request.to_sql(),
            r#"SELECT * FROM "pool_matrix" WHERE "contract_address" = $1 LIMIT 1 OFFSET 0"#
        );
        assert_eq!(request.bind_value(), Some("zig1abc"));
    }

    #[test]
    fn test_page_local_sort_descending() {
        // Page order differs from global top order on purpose; only the
        // fetched rows get ordered.
        let mut rows = vec![
            holder("a", json!("12.5")),
            holder("b", json!("900.0")),
            holder("c", json!("0.25")),
            holder("d", json!(45)),
        ];
        sort_page_descending(&mut rows, DISPLAY_AMOUNT_COLUMN);

        let order: Vec<&str> = rows
            .iter()
            .map(|r| r.get("address").unwrap().as_str().unwrap())
            .collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_sort_mixed_numbers_and_strings() {
        let mut rows = vec![
            holder("a", json!(1.5)),
            holder("b", json!("2.5")),
            holder("c", json!(3)),
        ];
        sort_page_descending(&mut rows, DISPLAY_AMOUNT_COLUMN);
        let order: Vec<&str> = rows
            .iter()
            .map(|r| r.get("address").unwrap().as_str().unwrap())
            .collect();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_missing_values_last() {
        let mut rows = vec![
            holder("a", JsonValue::Null),
            holder("b", json!("10")),
            holder("c", json!("not a number")),
        ];
        sort_page_descending(&mut rows, DISPLAY_AMOUNT_COLUMN);
        assert_eq!(rows[0].get("address").unwrap(), "b");
    }

    #[test]
    fn test_sort_empty_page() {
        let mut rows: Vec<serde_json::Map<String, JsonValue>> = Vec::new();
        sort_page_descending(&mut rows, DISPLAY_AMOUNT_COLUMN);
        assert!(rows.is_empty());
    }
}
