use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint
///
/// Always answers 200 while the process is up; the `database` field reports
/// whether a connection could be made within `health_check_timeout`.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let timeout = state.config.health_check_timeout;

    let database = match tokio::time::timeout(timeout, state.store.ping()).await {
        Ok(Ok(())) => "connected",
        Ok(Err(e)) => {
            tracing::error!("Database health check failed: {:?}", e);
            "disconnected"
        }
        Err(_) => {
            tracing::warn!(
                "Database health check gave up after {}ms",
                timeout.as_millis()
            );
            "disconnected"
        }
    };

    Json(json!({
        "status": "OK",
        "message": "Quick Revisor API is running",
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
