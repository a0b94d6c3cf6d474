use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AccountConfig;
use crate::error::ServiceError;
use crate::gateway::{Gateway, User};
use crate::session::LOGIN_ROUTE;

/// Password sign-in, sign-out and the two-step password reset.
pub struct AccountService<G: ?Sized> {
    gateway: Arc<G>,
    reset_redirect: String,
}

impl<G: ?Sized> Clone for AccountService<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            reset_redirect: self.reset_redirect.clone(),
        }
    }
}

impl<G> AccountService<G>
where
    G: Gateway + ?Sized,
{
    pub fn new(gateway: Arc<G>, config: &AccountConfig) -> Self {
        Self {
            gateway,
            reset_redirect: config.password_reset_redirect.clone(),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let session = self
            .gateway
            .sign_in_with_password(email, password)
            .await
            .map_err(ServiceError::from)?;
        info!(user_id = %session.user.id, "resident signed in");
        Ok(session.user)
    }

    /// Ends the session and returns the route to show next.
    ///
    /// The local session is dropped even when the backend call fails, so a
    /// resident is never stuck signed in on this device.
    pub async fn sign_out(&self) -> Result<&'static str, ServiceError> {
        if let Err(err) = self.gateway.sign_out().await {
            warn!(error = %err, "remote sign-out failed; clearing local session");
            self.gateway.sessions().sign_out();
        }
        Ok(LOGIN_ROUTE)
    }

    /// Sends a recovery link that lands on the configured reset page.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ServiceError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ServiceError::Validation("Email is required".to_string()));
        }

        self.gateway
            .reset_password_for_email(email, &self.reset_redirect)
            .await
            .map_err(ServiceError::from)?;
        info!("password recovery email requested");
        Ok(())
    }

    /// Sets a new password for the recovering session and returns the route
    /// to show next.
    pub async fn reset_password(
        &self,
        password: &str,
        confirm_password: &str,
    ) -> Result<&'static str, ServiceError> {
        if password != confirm_password {
            return Err(ServiceError::Validation(
                "Passwords do not match".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(ServiceError::Validation("Password is required".to_string()));
        }

        let user = self
            .gateway
            .update_password(password)
            .await
            .map_err(ServiceError::from)?;
        info!(user_id = %user.id, "password updated");
        Ok(LOGIN_ROUTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, InMemoryGateway};
    use crate::session::AuthEvent;

    fn config() -> AccountConfig {
        AccountConfig {
            password_reset_redirect: "https://desk.example.org/reset".to_string(),
            credentials: None,
        }
    }

    fn service() -> (Arc<InMemoryGateway>, AccountService<InMemoryGateway>) {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.register_user("u1", "asha@example.com", "secret123");
        let service = AccountService::new(Arc::clone(&gateway), &config());
        (gateway, service)
    }

    #[tokio::test]
    async fn sign_in_installs_session() {
        let (gateway, service) = service();

        let user = service
            .sign_in(" asha@example.com ", "secret123")
            .await
            .expect("signed in");

        assert_eq!(user.id.as_str(), "u1");
        assert!(gateway.sessions().is_authenticated());
    }

    #[tokio::test]
    async fn wrong_password_is_a_validation_error() {
        let (gateway, service) = service();

        let err = service
            .sign_in("asha@example.com", "nope")
            .await
            .expect_err("rejected");

        assert_eq!(
            err,
            ServiceError::Validation("Invalid login credentials".to_string())
        );
        assert!(!gateway.sessions().is_authenticated());
    }

    #[tokio::test]
    async fn blank_credentials_skip_the_backend() {
        let (gateway, service) = service();

        assert!(service.sign_in("", "secret123").await.is_err());
        assert!(service.sign_in("asha@example.com", "").await.is_err());
        assert_eq!(gateway.network_calls(), 0);
    }

    #[tokio::test]
    async fn sign_out_clears_session_even_when_backend_fails() {
        let (gateway, service) = service();
        gateway.sign_in_as("u1");
        gateway.fail_on("sign_out", GatewayError::Network("offline".to_string()));

        let next = service.sign_out().await.expect("signed out");

        assert_eq!(next, LOGIN_ROUTE);
        assert!(gateway.session().is_none());
    }

    #[tokio::test]
    async fn recovery_uses_configured_redirect() {
        let (gateway, service) = service();

        service
            .request_password_reset("asha@example.com")
            .await
            .expect("requested");

        let requests = gateway.recovery_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].redirect_to, "https://desk.example.org/reset");
    }

    #[tokio::test]
    async fn recovery_rejects_malformed_email() {
        let (_, service) = service();

        let err = service
            .request_password_reset("not-an-email")
            .await
            .expect_err("invalid");

        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn reset_requires_matching_passwords() {
        let (gateway, service) = service();
        gateway.sign_in_as("u1");

        let err = service
            .reset_password("new-secret", "new-secret!")
            .await
            .expect_err("mismatch");

        assert_eq!(err, ServiceError::Validation("Passwords do not match".to_string()));
        assert_eq!(gateway.network_calls(), 0);
    }

    #[tokio::test]
    async fn reset_updates_password_and_routes_to_login() {
        let (gateway, service) = service();
        gateway.sign_in_as("u1");
        let mut events = gateway.sessions().subscribe();

        let next = service
            .reset_password("new-secret", "new-secret")
            .await
            .expect("password updated");

        assert_eq!(next, LOGIN_ROUTE);
        let change = events.changed().await.expect("auth change");
        assert_eq!(change.event, AuthEvent::UserUpdated);

        service.sign_out().await.expect("signed out");
        service
            .sign_in("asha@example.com", "new-secret")
            .await
            .expect("new password accepted");
    }

    #[tokio::test]
    async fn reset_without_session_asks_for_login() {
        let (_, service) = service();

        let err = service
            .reset_password("new-secret", "new-secret")
            .await
            .expect_err("no session");

        assert!(err.requires_login());
    }
}
