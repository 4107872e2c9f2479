//! Resilient query execution.
//!
//! Wraps a single query in a bounded-retry loop: transient connection-level
//! failures are retried up to 3 attempts with linear backoff (0.5s, 1.0s);
//! any other failure surfaces immediately. The first success wins. Each
//! failed attempt releases its connection back to the pool before the backoff
//! sleep, and the next attempt acquires a fresh one; the sleep itself is a
//! suspension point, so a cancelled request abandons the remaining attempts.

use std::time::{Duration, Instant};

use sqlx::PgPool;
use tracing::{debug, error, warn};

use crate::db::rows::row_to_json;
use crate::error::{ApiError, ApiResult, is_transient};
use crate::models::{QueryOutcome, QueryRequest};

/// Total attempt budget per query invocation.
pub const MAX_ATTEMPTS: u32 = 3;

/// Backoff base; attempt N sleeps N times this before retrying.
pub const BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Retry bounds for one query invocation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_backoff: BASE_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Linear backoff for the given attempt number (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * attempt
    }
}

/// Query executor with bounded retry on transient failure.
#[derive(Debug, Clone, Default)]
pub struct QueryExecutor {
    policy: RetryPolicy,
}

impl QueryExecutor {
    /// Create an executor with the default retry policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor with a custom retry policy.
    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Execute a query request and shape the rows.
    ///
    /// The caller must have checked the table binding; this only sees
    /// requests built against bound tables.
    pub async fn fetch(&self, pool: &PgPool, request: &QueryRequest) -> ApiResult<QueryOutcome> {
        let sql = request.to_sql();
        let bind = request.bind_value().map(String::from);

        debug!(sql = %sql, has_bind = bind.is_some(), "Executing query");

        let (rows, elapsed, attempts) = self
            .run_with_retry(|| {
                let sql = sql.clone();
                let bind = bind.clone();
                let pool = pool.clone();
                async move {
                    let query = match &bind {
                        Some(value) => sqlx::query(&sql).bind(value.clone()),
                        None => sqlx::query(&sql),
                    };
                    query.fetch_all(&pool).await
                }
            })
            .await?;

        let rows: Vec<_> = rows.iter().map(row_to_json).collect();
        debug!(
            rows = rows.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            attempts,
            "Query complete"
        );

        Ok(QueryOutcome {
            rows,
            elapsed,
            attempts,
        })
    }

    /// Run one operation under the retry policy.
    ///
    /// Returns the successful value together with the total elapsed time
    /// (backoff included) and the number of attempts consumed.
    pub async fn run_with_retry<T, F, Fut>(&self, mut op: F) -> ApiResult<(T, Duration, u32)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let start = Instant::now();
        let mut attempt: u32 = 1;

        loop {
            match op().await {
                Ok(value) => {
                    return Ok((value, start.elapsed(), attempt));
                }
                Err(err) if is_transient(&err) => {
                    if attempt >= self.policy.max_attempts {
                        error!(
                            attempt,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            error = %err,
                            "Retry budget exhausted"
                        );
                        return Err(ApiError::unavailable(format!(
                            "Database unreachable after {attempt} attempts"
                        )));
                    }
                    let backoff = self.policy.backoff(attempt);
                    warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        error = %err,
                        "Transient database error, retrying"
                    );
                    // The failed attempt's connection is already back in the
                    // pool; nothing is held across this sleep.
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(attempt, error = %err, "Query failed with non-retryable error");
                    return Err(err.into());
                }
            }
        }
    }
}
