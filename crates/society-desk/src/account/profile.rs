use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::gateway::{Gateway, GatewayError, Predicate, Query, UserId};
use crate::session::SessionGuard;

pub const PROFILES_TABLE: &str = "profiles";
pub const AVATAR_BUCKET: &str = "avatars";

const AVATAR_CONTENT_TYPE: &str = "image/jpeg";

/// Row of the `profiles` table, keyed by the auth user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub flat_number: Option<String>,
}

/// Settings-screen access to the signed-in resident's profile.
pub struct ProfileService<G: ?Sized> {
    gateway: Arc<G>,
    guard: SessionGuard<G>,
}

impl<G: ?Sized> Clone for ProfileService<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            guard: self.guard.clone(),
        }
    }
}

impl<G> ProfileService<G>
where
    G: Gateway + ?Sized,
{
    pub fn new(gateway: Arc<G>) -> Self {
        let guard = SessionGuard::new(Arc::clone(&gateway));
        Self { gateway, guard }
    }

    pub async fn fetch_profile(&self) -> Result<Profile, ServiceError> {
        let session = self.guard.require_session()?;

        let query = Query::from(PROFILES_TABLE).filter(Predicate::eq("id", session.user.id.as_str()));
        let rows = self.gateway.query(&query).await.map_err(surface)?;

        let row = rows.into_iter().next().ok_or_else(|| {
            debug!(user_id = %session.user.id, "no profile row for user");
            ServiceError::NotFound("Profile not found".to_string())
        })?;
        serde_json::from_value(row).map_err(|err| surface(err.into()))
    }

    /// Stores a new avatar image, points the profile at it and returns the
    /// refreshed profile.
    pub async fn upload_avatar(&self, image: Vec<u8>) -> Result<Profile, ServiceError> {
        if image.is_empty() {
            return Err(ServiceError::Validation("Avatar image is empty".to_string()));
        }
        let user = self.guard.require_user().await?;

        let now = Utc::now();
        let path = format!("avatars/{}-{}.jpg", user.id, now.timestamp_millis());
        let stored = self
            .gateway
            .upload(AVATAR_BUCKET, &path, image, AVATAR_CONTENT_TYPE)
            .await
            .map_err(surface)?;
        let avatar_url = self.gateway.public_object_url(AVATAR_BUCKET, &stored);

        let patch = json!({
            "avatar_url": avatar_url,
            "updated_at": now.to_rfc3339_opts(SecondsFormat::Micros, true),
        });
        let updated = self
            .gateway
            .update(PROFILES_TABLE, &[Predicate::eq("id", user.id.as_str())], patch)
            .await
            .map_err(surface)?;
        if updated.is_empty() {
            return Err(ServiceError::NotFound("Profile not found".to_string()));
        }

        info!(user_id = %user.id, path = %stored, "avatar updated");
        self.fetch_profile().await
    }
}

fn surface(err: GatewayError) -> ServiceError {
    let err = ServiceError::from(err);
    warn!(error = %err, reauth = err.requires_login(), "profile call failed");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;

    fn gateway_with_profile() -> Arc<InMemoryGateway> {
        let gateway = InMemoryGateway::new().with_base_url("https://desk.example.org/");
        gateway.register_user("u1", "asha@example.com", "secret123");
        gateway.seed(
            PROFILES_TABLE,
            [json!({
                "id": "u1",
                "updated_at": "2024-02-01T09:00:00Z",
                "username": "asha",
                "full_name": "Asha Verma",
                "avatar_url": null,
                "flat_number": "A-101",
            })],
        );
        Arc::new(gateway)
    }

    #[tokio::test]
    async fn fetches_the_current_users_profile() {
        let gateway = gateway_with_profile();
        gateway.sign_in_as("u1");

        let profile = ProfileService::new(gateway).fetch_profile().await.expect("profile");

        assert_eq!(profile.full_name, "Asha Verma");
        assert_eq!(profile.flat_number.as_deref(), Some("A-101"));
        assert_eq!(profile.avatar_url, None);
    }

    #[tokio::test]
    async fn missing_row_is_not_found() {
        let gateway = gateway_with_profile();
        gateway.register_user("u2", "ravi@example.com", "secret123");
        gateway.sign_in_as("u2");

        let err = ProfileService::new(gateway)
            .fetch_profile()
            .await
            .expect_err("no row");

        assert_eq!(err, ServiceError::NotFound("Profile not found".to_string()));
    }

    #[tokio::test]
    async fn signed_out_fetch_redirects_without_network_call() {
        let gateway = gateway_with_profile();

        let err = ProfileService::new(gateway.clone())
            .fetch_profile()
            .await
            .expect_err("signed out");

        assert!(err.requires_login());
        assert_eq!(gateway.network_calls(), 0);
    }

    #[tokio::test]
    async fn avatar_upload_stores_image_and_updates_profile() {
        let gateway = gateway_with_profile();
        gateway.sign_in_as("u1");

        let profile = ProfileService::new(gateway.clone())
            .upload_avatar(vec![0xFF, 0xD8, 0xFF])
            .await
            .expect("uploaded");

        let url = profile.avatar_url.expect("avatar url");
        let public_root = "https://desk.example.org/storage/v1/object/public/avatars/";
        assert!(url.starts_with(public_root), "unexpected url {url}");
        assert!(url.ends_with(".jpg"));

        let path = url.trim_start_matches(public_root);
        assert!(path.starts_with("avatars/u1-"), "unexpected object path {path}");
        let (bytes, content_type) = gateway.object(AVATAR_BUCKET, path).expect("stored object");
        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(content_type, "image/jpeg");
        let seeded = DateTime::parse_from_rfc3339("2024-02-01T09:00:00Z")
            .expect("timestamp")
            .with_timezone(&Utc);
        assert!(profile.updated_at.is_some_and(|at| at > seeded));
    }

    #[tokio::test]
    async fn empty_image_is_rejected() {
        let gateway = gateway_with_profile();
        gateway.sign_in_as("u1");

        let err = ProfileService::new(gateway.clone())
            .upload_avatar(Vec::new())
            .await
            .expect_err("empty");

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(gateway.network_calls(), 0);
    }

    #[tokio::test]
    async fn failed_upload_leaves_profile_untouched() {
        let gateway = gateway_with_profile();
        gateway.sign_in_as("u1");
        gateway.fail_on("upload", GatewayError::Network("payload too large".to_string()));

        let err = ProfileService::new(gateway.clone())
            .upload_avatar(vec![1, 2, 3])
            .await
            .expect_err("upload failed");

        assert_eq!(err, ServiceError::Network("payload too large".to_string()));
        assert_eq!(gateway.rows(PROFILES_TABLE)[0]["avatar_url"], json!(null));
    }
}
