use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json, Router};
use serde_json::json;
use society_desk::account::account_router;
use society_desk::community::{community_router, CommunityBoards};
use society_desk::config::AccountConfig;
use society_desk::gateway::Gateway;
use society_desk::maintenance::maintenance_router;
use std::sync::Arc;

pub(crate) fn with_desk_routes<G>(gateway: Arc<G>, account: &AccountConfig) -> Router
where
    G: Gateway + ?Sized + 'static,
{
    maintenance_router(Arc::clone(&gateway))
        .merge(account_router(gateway, account))
        .merge(community_router(CommunityBoards::standard()))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
