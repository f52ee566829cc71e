use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - service information
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "tenant-router",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Per-tenant database routing for the warehouse inventory backend",
            "headers": {
                "tenant": "X-Tenant-Id",
                "host": "X-Database-Host"
            },
            "endpoints": {
                "health": "/health (public)",
                "tenants": "/api/tenants/:id, /api/factories/:code/tenants",
                "shared": "/api/db/ping, /api/sequences/:name (cached connection per host)",
                "scoped": "/api/db/snapshot, /api/db/stream (connection per request)",
                "evict": "DELETE /api/db/connections/:host"
            }
        }
    }))
}

/// GET /health - registry size and the state of every cached connection.
/// Does not open connections.
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let connections = state.cache.snapshot().await;

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "environment": state.registry.environment(),
        "tenants": state.registry.len(),
        "connections": connections,
    })))
}
