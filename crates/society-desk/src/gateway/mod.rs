//! Boundary to the hosted backend that owns authentication, table storage and
//! file storage.
//!
//! Everything above this module talks to the backend through [`Gateway`]. Rows
//! travel as JSON objects; callers deserialize them into their own types.

pub(crate) mod memory;
mod query;
mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::SessionState;

pub use memory::{InMemoryGateway, RecoveryRequest};
pub use query::{OrderBy, Predicate, Query};
pub use rest::RestGateway;

/// Identifier of an authenticated user as issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Authenticated context handed out by the backend on sign-in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Failures reported by a gateway call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("unexpected response from backend: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// True when the backend rejected the session token itself.
    pub fn is_session_rejected(&self) -> bool {
        match self {
            GatewayError::Auth(_) => true,
            GatewayError::Network(message) | GatewayError::Validation(message) => {
                message.contains("JWT")
            }
            GatewayError::NotFound(_) | GatewayError::Malformed(_) => false,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value.to_string())
    }
}

/// Client-side view of the hosted backend.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Process-wide session state owned by this client.
    fn sessions(&self) -> &SessionState;

    /// Current unexpired session, read synchronously from local state.
    fn session(&self) -> Option<Session> {
        self.sessions().current()
    }

    /// Resolves the user behind the current session against the backend.
    async fn current_user(&self) -> Result<Option<User>, GatewayError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, GatewayError>;

    async fn sign_out(&self) -> Result<(), GatewayError>;

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), GatewayError>;

    async fn update_password(&self, password: &str) -> Result<User, GatewayError>;

    async fn query(&self, query: &Query) -> Result<Vec<Value>, GatewayError>;

    async fn insert(&self, table: &str, row: Value) -> Result<Value, GatewayError>;

    async fn update(
        &self,
        table: &str,
        filters: &[Predicate],
        patch: Value,
    ) -> Result<Vec<Value>, GatewayError>;

    /// Stores an object and returns its path inside the bucket.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError>;

    fn public_object_url(&self, bucket: &str, path: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_messages_count_as_rejected_sessions() {
        assert!(GatewayError::Auth("invalid claim".to_string()).is_session_rejected());
        assert!(GatewayError::Network("JWT expired".to_string()).is_session_rejected());
        assert!(!GatewayError::Network("connection reset".to_string()).is_session_rejected());
        assert!(!GatewayError::NotFound("JWT".to_string()).is_session_rejected());
    }

    #[test]
    fn session_debug_hides_tokens() {
        let session = Session {
            access_token: "secret-token".to_string(),
            refresh_token: Some("secret-refresh".to_string()),
            expires_at: Utc::now(),
            user: User {
                id: UserId("u1".to_string()),
                email: None,
            },
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("u1"));
    }
}
