//! Route definitions and HTTP serving.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::http::{AppState, handlers};

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/v1/pools", get(handlers::list_pools))
        .route("/api/v1/pool/{address}", get(handlers::get_pool))
        .route(
            "/api/v1/pool/transactions/{address}",
            get(handlers::list_pool_transactions),
        )
        .route(
            "/api/v1/pool/ticker/{contractaddress}",
            get(handlers::list_pool_ticks),
        )
        .route(
            "/api/v1/denom/holders/{denomaddress}",
            get(handlers::list_denom_holders),
        )
        .layer(middleware::from_fn(process_time_header))
        .with_state(state)
}

/// Inject a response-time header into every response.
async fn process_time_header(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();
    if let Ok(value) = HeaderValue::from_str(&elapsed.to_string()) {
        response.headers_mut().insert("x-process-time", value);
    }
    response
}

/// Bind and serve until SIGINT/SIGTERM, then shut down gracefully.
pub async fn serve(state: Arc<AppState>, bind_addr: &str) -> ApiResult<()> {
    let app = router(state);

    let listener = TcpListener::bind(bind_addr).await.map_err(|e| {
        ApiError::internal(format!("Failed to bind to {bind_addr}: {e}"))
    })?;

    info!(addr = %bind_addr, "HTTP server listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(wait_for_signal());
    if let Err(e) = server.await {
        error!(error = %e, "HTTP server error");
        return Err(ApiError::internal(format!("HTTP server error: {e}")));
    }

    info!("HTTP server stopped");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
