use std::sync::Arc;

use tracing::debug;

use crate::error::ServiceError;
use crate::gateway::{Gateway, Session, User};

/// Short-circuits operations that cannot succeed without a session.
///
/// The backend enforces authorization on its own; the guard only avoids
/// issuing doomed requests and tells the screen layer to go to login.
pub struct SessionGuard<G: ?Sized> {
    gateway: Arc<G>,
}

impl<G: ?Sized> Clone for SessionGuard<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<G> SessionGuard<G>
where
    G: Gateway + ?Sized,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Current session, read locally without touching the network.
    pub fn require_session(&self) -> Result<Session, ServiceError> {
        self.gateway.session().ok_or_else(|| {
            debug!("no active session; redirecting to login");
            ServiceError::no_session()
        })
    }

    /// Authenticated user, confirmed with the backend.
    pub async fn require_user(&self) -> Result<User, ServiceError> {
        self.require_session()?;
        match self.gateway.current_user().await? {
            Some(user) => Ok(user),
            None => {
                debug!("backend returned no user for the current session");
                Err(ServiceError::not_authenticated())
            }
        }
    }
}
