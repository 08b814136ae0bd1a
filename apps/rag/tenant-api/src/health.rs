//! Readiness check against the configured vector backend.

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};

use crate::SharedStore;

/// Readiness check endpoint that probes the vector backend.
pub async fn ready_handler(State(store): State<SharedStore>) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "vector_backend",
        Box::pin(async {
            store
                .health_check()
                .await
                .map_err(|e| format!("Vector backend check failed: {}", e))
        }),
    )];

    match run_health_checks(checks).await {
        Ok((status, json)) => (status, json).into_response(),
        Err((status, json)) => (status, json).into_response(),
    }
}

/// Creates a router with the /ready endpoint.
pub fn ready_router(store: SharedStore) -> Router {
    Router::new()
        .route("/ready", get(ready_handler))
        .with_state(store)
}
