mod common;

use axum::http::StatusCode;
use std::sync::Arc;

use tenant_router::app::{self, AppState};
use tenant_router::config::Environment;

fn router(environment: Environment) -> axum::Router {
    app::router(AppState::new(
        common::config(environment, false),
        common::registry(environment),
        Arc::new(common::CountingConnector::default()),
    ))
}

#[tokio::test]
async fn inactive_tenants_are_visible_by_id() {
    let res = common::send(&router(Environment::Production), common::get("/api/tenants/tenant-b", &[])).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = common::json_body(res).await;
    assert_eq!(body["data"]["id"], "tenant-b");
    assert_eq!(body["data"]["active"], false);
}

#[tokio::test]
async fn factory_lookup_returns_only_active_tenants() {
    let res = common::send(&router(Environment::Production), common::get("/api/factories/F1/tenants", &[])).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = common::json_body(res).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["tenant-a"]);
}

#[tokio::test]
async fn development_tenants_only_outside_production() {
    let res = common::send(&router(Environment::Development), common::get("/api/factories/F1/tenants", &[])).await;
    let body = common::json_body(res).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["tenant-a", "tenant-dev"]);
}

#[tokio::test]
async fn unknown_lookups_are_not_found() {
    let router = router(Environment::Production);

    let res = common::send(&router, common::get("/api/tenants/missing", &[])).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = common::json_body(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");

    let res = common::send(&router, common::get("/api/factories/F9/tenants", &[])).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
