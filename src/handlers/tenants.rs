use axum::extract::{Path, State};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::registry::TenantRecord;

/// GET /api/tenants/:id - inactive tenants are returned as well
pub async fn tenant_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<TenantRecord> {
    let tenant = state.registry.find_by_id(&id)?;
    Ok(ApiResponse::success(tenant.clone()))
}

/// GET /api/factories/:code/tenants - active tenants serving a factory
pub async fn factory_tenants_get(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Vec<TenantRecord>> {
    let tenants = state.registry.find_by_factory(&code)?;
    Ok(ApiResponse::success(tenants.into_iter().cloned().collect()))
}
