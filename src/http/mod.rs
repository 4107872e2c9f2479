//! HTTP surface: route definitions, handlers, and shared state.

pub mod handlers;
pub mod routes;

use sqlx::PgPool;

use crate::db::{QueryExecutor, TableBindings};

pub use routes::{router, serve};

/// Application context shared across handlers.
///
/// Constructed once at startup and passed in as axum state; nothing here is
/// mutated by request handling.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tables: TableBindings,
    pub executor: QueryExecutor,
}

impl AppState {
    pub fn new(pool: PgPool, tables: TableBindings) -> Self {
        Self {
            pool,
            tables,
            executor: QueryExecutor::new(),
        }
    }
}
