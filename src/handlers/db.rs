use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures::stream::{self, Stream};
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantConnection};

const SNAPSHOT_SQL: &str = "SELECT current_database() AS database, now() AS server_time, version() AS version";

/// GET /api/db/ping - round trip through the shared connection for this host
pub async fn ping_get(Extension(conn): Extension<TenantConnection>) -> ApiResult<Value> {
    conn.handle.ping().await?;

    Ok(ApiResponse::success(json!({
        "tenant": conn.tenant_id,
        "host": conn.host,
        "connection": conn.handle.id(),
        "lifecycle": conn.handle.lifecycle(),
        "status": "ok",
    })))
}

/// DELETE /api/db/connections/:host - drop the cached connection so the next
/// shared request reconnects
pub async fn connection_delete(
    State(state): State<AppState>,
    Path(host): Path<String>,
    auth_user: Option<Extension<AuthUser>>,
) -> ApiResult<Value> {
    // A tenant-bound token may only evict its own tenant's host
    if let Some(bound) = auth_user.as_ref().and_then(|Extension(u)| u.tenant.as_deref()) {
        let owns_host = state
            .registry
            .find_by_host(&host)
            .map_or(false, |tenants| tenants.iter().any(|t| t.id == bound));
        if !owns_host {
            return Err(ApiError::forbidden(format!("Token is not valid for host '{}'", host)));
        }
    }

    if !state.cache.evict(&host).await {
        return Err(ApiError::not_found(format!("No cached connection for '{}'", host)));
    }

    Ok(ApiResponse::success(json!({ "host": host, "evicted": true })))
}

/// GET /api/db/snapshot - one query on a connection opened for this request
pub async fn snapshot_get(Extension(conn): Extension<TenantConnection>) -> ApiResult<Map<String, Value>> {
    let mut rows = conn.handle.fetch_json(SNAPSHOT_SQL).await?;
    if rows.is_empty() {
        return Err(ApiError::internal_server_error("Database returned no snapshot"));
    }

    let mut snapshot = rows.swap_remove(0);
    snapshot.insert("tenant".to_string(), json!(conn.tenant_id));
    snapshot.insert("host".to_string(), json!(conn.host));
    Ok(ApiResponse::success(snapshot))
}

/// GET /api/db/stream - heartbeat events through a request-scoped connection.
///
/// The connection stays open for as long as the client listens and is torn
/// down when the stream is dropped. A failed query ends the stream.
pub async fn stream_get(
    State(state): State<AppState>,
    Extension(conn): Extension<TenantConnection>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let interval = Duration::from_secs(state.config.server.sse_interval_secs.max(1));

    let events = stream::unfold((conn, 0u64, false), move |(conn, sequence, finished)| async move {
        if finished {
            return None;
        }
        if sequence > 0 {
            tokio::time::sleep(interval).await;
        }

        match conn.handle.ping().await {
            Ok(()) => {
                let event = Event::default().event("heartbeat").id(sequence.to_string()).json_data(json!({
                    "tenant": conn.tenant_id,
                    "host": conn.host,
                    "sequence": sequence,
                    "at": chrono::Utc::now(),
                }));
                Some((event, (conn, sequence + 1, false)))
            }
            Err(e) => {
                tracing::warn!("Heartbeat query failed for {}: {}", conn.host, e);
                let event = Ok(Event::default().event("error").data(e.to_string()));
                Some((event, (conn, sequence + 1, true)))
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
