use std::sync::Arc;

use axum::{
    extract::{Query as QueryString, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::domain::MaintenanceRequestDraft;
use super::filter::{FilterCriteria, FilterParams};
use super::repository::RequestRepository;
use super::service::RequestCreationService;
use crate::error::ServiceError;
use crate::gateway::Gateway;

/// Shared state behind the maintenance endpoints.
pub struct MaintenanceRoutes<G: ?Sized> {
    repository: RequestRepository<G>,
    creator: RequestCreationService<G>,
}

impl<G> MaintenanceRoutes<G>
where
    G: Gateway + ?Sized,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            repository: RequestRepository::new(Arc::clone(&gateway)),
            creator: RequestCreationService::new(gateway),
        }
    }
}

/// Router builder exposing listing, stats and creation.
pub fn maintenance_router<G>(gateway: Arc<G>) -> Router
where
    G: Gateway + ?Sized + 'static,
{
    Router::new()
        .route(
            "/api/v1/maintenance/requests",
            get(list_handler::<G>).post(create_handler::<G>),
        )
        .route("/api/v1/maintenance/stats", get(stats_handler::<G>))
        .with_state(Arc::new(MaintenanceRoutes::new(gateway)))
}

pub(crate) async fn list_handler<G>(
    State(routes): State<Arc<MaintenanceRoutes<G>>>,
    QueryString(params): QueryString<FilterParams>,
) -> Response
where
    G: Gateway + ?Sized + 'static,
{
    let criteria = match FilterCriteria::try_from(params) {
        Ok(criteria) => criteria,
        Err(err) => return err.into_response(),
    };

    match routes.repository.list_requests(&criteria).await {
        Ok(requests) => {
            let payload = json!({
                "count": requests.len(),
                "requests": requests,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn stats_handler<G>(State(routes): State<Arc<MaintenanceRoutes<G>>>) -> Response
where
    G: Gateway + ?Sized + 'static,
{
    match routes.repository.get_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn create_handler<G>(
    State(routes): State<Arc<MaintenanceRoutes<G>>>,
    Json(draft): Json<MaintenanceRequestDraft>,
) -> Response
where
    G: Gateway + ?Sized + 'static,
{
    match routes.creator.create_request(&draft).await {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(err @ ServiceError::Validation(_)) => {
            let payload = json!({
                "error": err.to_string(),
                "draft": draft,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
