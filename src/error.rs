//! Error types for the Dex API.
//!
//! This module defines all error types using `thiserror` and classifies
//! `sqlx` failures into the categories the retry layer and the HTTP surface
//! care about: transient connectivity, fatal query errors, missing schema,
//! and missing resources.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    /// A connection-level failure. Retryable.
    #[error("Connection failed: {message}")]
    Connection { message: String },

    /// Retry budget exhausted on a transient failure.
    #[error("Service temporarily unavailable: {message}")]
    Unavailable { message: String },

    /// A query-logic failure reported by the database. Never retried.
    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42703" for undefined column
        sql_state: Option<String>,
    },

    /// An expected table was never bound at startup.
    #[error("Table not found: {table}")]
    SchemaUnavailable { table: String },

    /// A single-entity lookup matched zero rows.
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a service-unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a schema-unavailable error for a missing table.
    pub fn schema_unavailable(table: impl Into<String>) -> Self {
        Self::SchemaUnavailable {
            table: table.into(),
        }
    }

    /// Create a resource-not-found outcome.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// SQLSTATE codes that indicate the connection itself failed rather than the
/// query: class 08 (connection exception) plus the admin/crash shutdown codes.
const CONNECTION_SQL_STATES: &[&str] = &[
    "08000", "08001", "08003", "08004", "08006", "08007", "08P01", "57P01", "57P02", "57P03",
];

/// Classify a sqlx error as transient (connection-level, worth retrying)
/// versus fatal (query-level, retrying cannot help).
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| CONNECTION_SQL_STATES.contains(&code.as_ref())),
        _ => false,
    }
}

/// Convert sqlx errors to ApiError. Transient errors become `Connection`;
/// everything else is a fatal query error.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient(&err) {
            return ApiError::connection(err.to_string());
        }
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                ApiError::database(db_err.message(), code)
            }
            sqlx::Error::Configuration(msg) => ApiError::internal(format!(
                "Invalid database configuration: {msg}"
            )),
            sqlx::Error::RowNotFound => ApiError::internal("No rows returned"),
            sqlx::Error::ColumnNotFound(col) => {
                ApiError::internal(format!("Column not found: {col}"))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                ApiError::internal(format!("Failed to decode column {index}: {source}"))
            }
            sqlx::Error::Decode(source) => ApiError::internal(format!("Decode error: {source}")),
            other => ApiError::internal(format!("Unknown database error: {other}")),
        }
    }
}

/// Result type alias for query operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP mapping. Internal detail is logged here; clients receive a generic
/// classified message. Schema-unavailable and single-entity misses are soft
/// 200 payloads, matching the surface the original clients were built against.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::SchemaUnavailable { table } => {
                warn!(table = %table, "Request against unbound table");
                (StatusCode::OK, Json(json!({ "error": "Table not found" }))).into_response()
            }
            ApiError::NotFound { resource } => (
                StatusCode::OK,
                Json(json!({ "message": format!("{resource} not found") })),
            )
                .into_response(),
            ApiError::Connection { .. } | ApiError::Unavailable { .. } => {
                error!(error = %self, "Database unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": "Service temporarily unavailable" })),
                )
                    .into_response()
            }
            ApiError::Database { .. } | ApiError::Internal { .. } => {
                error!(error = %self, "Query execution failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::connection("broken pipe");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_error_retryable() {
        assert!(ApiError::connection("err").is_retryable());
        assert!(!ApiError::unavailable("err").is_retryable());
        assert!(!ApiError::database("syntax error", None).is_retryable());
    }

    #[test]
    fn test_io_error_is_transient() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ));
        assert!(is_transient(&err));
    }

    #[test]
    fn test_pool_closed_is_transient() {
        assert!(is_transient(&sqlx::Error::PoolClosed));
        assert!(is_transient(&sqlx::Error::PoolTimedOut));
        assert!(is_transient(&sqlx::Error::WorkerCrashed));
    }

    #[test]
    fn test_row_not_found_is_fatal() {
        assert!(!is_transient(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn test_column_not_found_is_fatal() {
        let err = sqlx::Error::ColumnNotFound("liquidity".to_string());
        assert!(!is_transient(&err));
    }

    #[test]
    fn test_transient_sqlx_error_maps_to_connection() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "broken pipe",
        ));
        let api_err: ApiError = err.into();
        assert!(matches!(api_err, ApiError::Connection { .. }));
    }

    #[test]
    fn test_fatal_sqlx_error_maps_to_internal() {
        let api_err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(api_err, ApiError::Internal { .. }));
    }

    #[test]
    fn test_schema_unavailable_is_soft_200() {
        let response = ApiError::schema_unavailable("pool_matrix").into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_not_found_is_soft_200() {
        let response = ApiError::not_found("Pool").into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_unavailable_maps_to_503() {
        let response = ApiError::unavailable("retries exhausted").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_database_error_maps_to_500() {
        let response = ApiError::database("bad predicate", Some("42703".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
