use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::auth::AuthUser;
use super::sweeper;
use crate::database::{ConnectionCache, ConnectionHandle, Lifecycle};
use crate::error::ApiError;
use crate::registry::TenantRegistry;

pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const DATABASE_HOST_HEADER: &str = "x-database-host";

/// The connection bound to the current request, read by handlers via
/// `Extension<TenantConnection>`
#[derive(Clone, Debug)]
pub struct TenantConnection {
    /// Set when the request named a tenant; host-addressed requests may be
    /// served by several tenants sharing one database server
    pub tenant_id: Option<String>,
    pub host: String,
    pub handle: Arc<ConnectionHandle>,
}

/// Binder state for one route group. Each group picks a single lifecycle.
#[derive(Clone)]
pub struct TenantBinder {
    pub registry: Arc<TenantRegistry>,
    pub cache: Arc<ConnectionCache>,
    pub lifecycle: Lifecycle,
}

impl TenantBinder {
    pub fn new(registry: Arc<TenantRegistry>, cache: Arc<ConnectionCache>, lifecycle: Lifecycle) -> Self {
        Self {
            registry,
            cache,
            lifecycle,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Target {
    Tenant(String),
    Host(String),
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_target(headers: &HeaderMap) -> Option<Target> {
    header_value(headers, TENANT_ID_HEADER)
        .map(Target::Tenant)
        .or_else(|| header_value(headers, DATABASE_HOST_HEADER).map(Target::Host))
}

/// Resolve the tenant header, open or reuse a connection, and attach it to
/// the request. Nothing is opened unless resolution succeeds.
pub async fn bind_tenant(
    State(binder): State<TenantBinder>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let target = read_target(request.headers()).ok_or_else(|| ApiError::bad_request("tenant/host required"))?;
    let auth_user = request.extensions().get::<AuthUser>().cloned();

    let (tenant_id, host) = match target {
        Target::Tenant(id) => {
            let tenant = binder.registry.resolve(&id).map_err(|e| {
                tracing::warn!("Rejected tenant '{}': {}", id, e);
                ApiError::from(e)
            })?;
            (Some(tenant.id.clone()), tenant.host.clone())
        }
        Target::Host(host) => {
            let tenants = binder.registry.find_by_host(&host).map_err(|e| {
                tracing::warn!("Rejected database host '{}': {}", host, e);
                ApiError::from(e)
            })?;
            let tenant_id = match tenants.as_slice() {
                [only] => Some(only.id.clone()),
                _ => None,
            };
            if let Some(bound) = auth_user.as_ref().and_then(|u| u.tenant.as_deref()) {
                if !tenants.iter().any(|t| t.id == bound) {
                    return Err(ApiError::forbidden(format!("Token is not valid for host '{}'", host)));
                }
            }
            (tenant_id, host)
        }
    };

    if let (Some(bound), Some(requested)) = (
        auth_user.as_ref().and_then(|u| u.tenant.as_deref()),
        tenant_id.as_deref(),
    ) {
        if bound != requested {
            return Err(ApiError::forbidden(format!("Token is not valid for tenant '{}'", requested)));
        }
    }

    let handle = match binder.lifecycle {
        Lifecycle::Shared => binder.cache.get_or_create(&host).await?,
        Lifecycle::RequestScoped => binder.cache.open_scoped(&host).await?,
    };

    tracing::debug!(
        "Bound {:?} connection {} ({}) for tenant {:?}",
        handle.lifecycle(),
        handle.id(),
        host,
        tenant_id
    );

    request.extensions_mut().insert(TenantConnection {
        tenant_id,
        host,
        handle: handle.clone(),
    });

    let response = next.run(request).await;
    Ok(sweeper::attach(response, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn tenant_header_wins_over_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("tenant-a"));
        headers.insert(DATABASE_HOST_HEADER, HeaderValue::from_static("10.0.0.9"));
        assert_eq!(read_target(&headers), Some(Target::Tenant("tenant-a".to_string())));
    }

    #[test]
    fn blank_headers_count_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("   "));
        assert_eq!(read_target(&headers), None);

        headers.insert(DATABASE_HOST_HEADER, HeaderValue::from_static(" 10.0.0.1 "));
        assert_eq!(read_target(&headers), Some(Target::Host("10.0.0.1".to_string())));
    }
}
