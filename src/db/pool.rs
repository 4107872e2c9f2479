//! Connection pool construction.
//!
//! One process-wide `PgPool` is created at startup and torn down only at
//! process exit. Bounds: 10 steady connections plus 20 overflow, pre-flight
//! liveness check before a connection is handed out, connections recycled
//! after an hour, 10 second acquire budget.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::{
    Config, POOL_ACQUIRE_TIMEOUT_SECS, POOL_MAX_CONNECTIONS, POOL_MAX_LIFETIME_SECS,
    POOL_MIN_CONNECTIONS,
};
use crate::error::{ApiError, ApiResult};

/// Build the connection pool.
///
/// Connections are established lazily, so a database that is down at boot
/// does not abort startup; the schema resolver will log the failure and leave
/// all bindings unbound, and the liveness route keeps serving.
pub fn connect(config: &Config) -> ApiResult<PgPool> {
    let pool = PgPoolOptions::new()
        .min_connections(POOL_MIN_CONNECTIONS)
        .max_connections(POOL_MAX_CONNECTIONS)
        .max_lifetime(Duration::from_secs(POOL_MAX_LIFETIME_SECS))
        .acquire_timeout(Duration::from_secs(POOL_ACQUIRE_TIMEOUT_SECS))
        .test_before_acquire(true)
        .connect_lazy(&config.database_url())
        .map_err(|e| ApiError::connection(format!("Invalid database URL: {e}")))?;

    info!(
        host = %config.database_hostname,
        port = config.database_port,
        database = %config.database_name,
        min_connections = POOL_MIN_CONNECTIONS,
        max_connections = POOL_MAX_CONNECTIONS,
        "Created database connection pool"
    );

    Ok(pool)
}
