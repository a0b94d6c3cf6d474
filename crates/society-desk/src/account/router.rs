use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::auth::AccountService;
use super::profile::ProfileService;
use crate::config::AccountConfig;
use crate::gateway::Gateway;

pub struct AccountRoutes<G: ?Sized> {
    accounts: AccountService<G>,
    profiles: ProfileService<G>,
}

impl<G> AccountRoutes<G>
where
    G: Gateway + ?Sized,
{
    pub fn new(gateway: Arc<G>, config: &AccountConfig) -> Self {
        Self {
            accounts: AccountService::new(Arc::clone(&gateway), config),
            profiles: ProfileService::new(gateway),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignInPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoverPayload {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPayload {
    pub password: String,
    #[serde(alias = "confirmPassword")]
    pub confirm_password: String,
}

/// Session, password and profile endpoints.
pub fn account_router<G>(gateway: Arc<G>, config: &AccountConfig) -> Router
where
    G: Gateway + ?Sized + 'static,
{
    Router::new()
        .route(
            "/api/v1/session",
            post(sign_in_handler::<G>).delete(sign_out_handler::<G>),
        )
        .route("/api/v1/profile", get(profile_handler::<G>))
        .route("/api/v1/profile/avatar", put(avatar_handler::<G>))
        .route("/api/v1/password/recover", post(recover_handler::<G>))
        .route("/api/v1/password", put(reset_handler::<G>))
        .with_state(Arc::new(AccountRoutes::new(gateway, config)))
}

pub(crate) async fn sign_in_handler<G>(
    State(routes): State<Arc<AccountRoutes<G>>>,
    Json(payload): Json<SignInPayload>,
) -> Response
where
    G: Gateway + ?Sized + 'static,
{
    match routes.accounts.sign_in(&payload.email, &payload.password).await {
        Ok(user) => (StatusCode::OK, Json(json!({ "user": user }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn sign_out_handler<G>(State(routes): State<Arc<AccountRoutes<G>>>) -> Response
where
    G: Gateway + ?Sized + 'static,
{
    match routes.accounts.sign_out().await {
        Ok(next) => (StatusCode::OK, Json(json!({ "redirect": next }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn profile_handler<G>(State(routes): State<Arc<AccountRoutes<G>>>) -> Response
where
    G: Gateway + ?Sized + 'static,
{
    match routes.profiles.fetch_profile().await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn avatar_handler<G>(
    State(routes): State<Arc<AccountRoutes<G>>>,
    image: Bytes,
) -> Response
where
    G: Gateway + ?Sized + 'static,
{
    match routes.profiles.upload_avatar(image.to_vec()).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn recover_handler<G>(
    State(routes): State<Arc<AccountRoutes<G>>>,
    Json(payload): Json<RecoverPayload>,
) -> Response
where
    G: Gateway + ?Sized + 'static,
{
    match routes.accounts.request_password_reset(&payload.email).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(json!({ "status": "sent" }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn reset_handler<G>(
    State(routes): State<Arc<AccountRoutes<G>>>,
    Json(payload): Json<ResetPayload>,
) -> Response
where
    G: Gateway + ?Sized + 'static,
{
    match routes
        .accounts
        .reset_password(&payload.password, &payload.confirm_password)
        .await
    {
        Ok(next) => (StatusCode::OK, Json(json!({ "redirect": next }))).into_response(),
        Err(err) => err.into_response(),
    }
}
