#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use tenant_router::app::AppState;
use tenant_router::auth::{generate_jwt, Claims};
use tenant_router::config::{AppConfig, Environment};
use tenant_router::database::{ConnectionHandle, Connector};
use tenant_router::registry::{TenantRecord, TenantRegistry};

pub const SECRET: &str = "integration-secret";

/// Counts connection attempts; pools are lazy and never dial out
#[derive(Default)]
pub struct CountingConnector {
    opened: AtomicUsize,
    pools: Mutex<Vec<PgPool>>,
}

impl CountingConnector {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// The most recently opened pool, for handles the test cannot reach
    pub fn last_pool(&self) -> PgPool {
        self.pools.lock().unwrap().last().cloned().expect("no pool opened")
    }
}

#[async_trait]
impl Connector for CountingConnector {
    async fn connect(&self, options: &PgConnectOptions) -> Result<PgPool, sqlx::Error> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(50))
            .connect_lazy_with(options.clone());
        self.pools.lock().unwrap().push(pool.clone());
        Ok(pool)
    }
}

pub struct UnreachableConnector;

#[async_trait]
impl Connector for UnreachableConnector {
    async fn connect(&self, _options: &PgConnectOptions) -> Result<PgPool, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }
}

fn tenant(id: &str, host: &str, factories: &[&str], active: bool) -> TenantRecord {
    TenantRecord {
        id: id.to_string(),
        host: host.to_string(),
        factories: factories.iter().map(|f| f.to_string()).collect(),
        active,
        environments: None,
    }
}

pub fn registry(environment: Environment) -> TenantRegistry {
    let mut failover = tenant("tenant-dev", "10.0.9.9", &["F1"], true);
    failover.environments = Some(vec![Environment::Development]);

    TenantRegistry::new(
        vec![
            tenant("tenant-a", "10.0.0.1", &["F1"], true),
            tenant("tenant-b", "10.0.0.2", &["F1"], false),
            tenant("tenant-c", "10.0.0.3", &["F2"], true),
            failover,
        ],
        environment,
    )
    .unwrap()
}

pub fn config(environment: Environment, require_auth: bool) -> AppConfig {
    let mut config = AppConfig::for_environment(environment);
    config.security.require_auth = require_auth;
    config.security.jwt_secret = SECRET.to_string();
    config
}

pub fn state(connector: Arc<dyn Connector>) -> AppState {
    AppState::new(
        config(Environment::Production, false),
        registry(Environment::Production),
        connector,
    )
}

pub fn token(tenant: Option<&str>) -> String {
    generate_jwt(&Claims::new("integration", tenant.map(str::to_string), 1), SECRET).unwrap()
}

pub fn get(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Step a body frame by frame until end-of-stream, keeping it alive
pub async fn drain_frames(body: &mut Body) {
    while let Some(frame) = body.frame().await {
        frame.unwrap();
    }
}

pub async fn wait_destroyed(handle: &ConnectionHandle) {
    tokio::time::timeout(Duration::from_secs(2), handle.closed())
        .await
        .expect("connection was not destroyed");
}

pub async fn wait_pool_closed(pool: &PgPool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !pool.is_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("pool was not closed");
}

/// Collect the body's data frames, keeping the body alive
pub async fn read_frames(body: &mut Body) -> String {
    let mut text = String::new();
    while let Some(frame) = body.frame().await {
        if let Ok(data) = frame.unwrap().into_data() {
            text.push_str(&String::from_utf8_lossy(&data));
        }
    }
    text
}

pub fn request(method: &str, uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}
