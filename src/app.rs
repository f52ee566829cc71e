//! Composition root: wires the registry, the connection cache and the
//! binder into the router. Each tenant-bound route group is composed with
//! exactly one connection lifecycle.

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, Environment};
use crate::database::{ConnectionCache, ConnectionTemplate, Connector, Lifecycle};
use crate::handlers;
use crate::middleware::{bind_tenant, jwt_auth_middleware, AuthSettings, TenantBinder};
use crate::registry::TenantRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<TenantRegistry>,
    pub cache: Arc<ConnectionCache>,
}

impl AppState {
    pub fn new(config: AppConfig, registry: TenantRegistry, connector: Arc<dyn Connector>) -> Self {
        let template = ConnectionTemplate::from_config(&config.database);
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            cache: Arc::new(ConnectionCache::new(template, connector)),
        }
    }

    pub fn binder(&self, lifecycle: Lifecycle) -> TenantBinder {
        TenantBinder::new(self.registry.clone(), self.cache.clone(), lifecycle)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        // Protected
        .merge(protect(&state, registry_routes()))
        .merge(protect(&state, shared_routes(&state)))
        .merge(protect(&state, scoped_routes(&state)))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Registry lookups and cache administration; nothing here opens a connection
fn registry_routes() -> Router<AppState> {
    use handlers::{db, tenants};

    Router::new()
        .route("/api/tenants/:id", get(tenants::tenant_get))
        .route("/api/factories/:code/tenants", get(tenants::factory_tenants_get))
        .route("/api/db/connections/:host", delete(db::connection_delete))
}

/// Cached connection per host, shared across requests
fn shared_routes(state: &AppState) -> Router<AppState> {
    use handlers::{db, sequences};

    Router::new()
        .route("/api/db/ping", get(db::ping_get))
        .route("/api/sequences/:name", post(sequences::sequence_post))
        .route_layer(from_fn_with_state(state.binder(Lifecycle::Shared), bind_tenant))
}

/// Fresh connection per request, destroyed when the response ends
fn scoped_routes(state: &AppState) -> Router<AppState> {
    use handlers::db;

    Router::new()
        .route("/api/db/snapshot", get(db::snapshot_get))
        .route("/api/db/stream", get(db::stream_get))
        .route_layer(from_fn_with_state(state.binder(Lifecycle::RequestScoped), bind_tenant))
}

// JWT runs before tenant binding so the binder can see the token's tenant
fn protect(state: &AppState, routes: Router<AppState>) -> Router<AppState> {
    if !state.config.security.require_auth {
        return routes;
    }

    let settings = AuthSettings {
        jwt_secret: Arc::from(state.config.security.jwt_secret.as_str()),
    };
    routes.route_layer(from_fn_with_state(settings, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    if config.environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
