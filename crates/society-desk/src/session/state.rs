use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use crate::gateway::{Session, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// Notification delivered to subscribers on every auth transition.
#[derive(Debug, Clone)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

/// Process-wide auth state.
///
/// Clones share the same underlying channel, so a gateway and every screen
/// holding a clone observe the same session. Reads are synchronous; changes
/// are pushed to [`Subscription`]s.
#[derive(Clone)]
pub struct SessionState {
    inner: Arc<watch::Sender<AuthChange>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(AuthChange {
            event: AuthEvent::InitialSession,
            session: None,
        });
        Self {
            inner: Arc::new(sender),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.current_at(Utc::now())
    }

    /// Expired sessions read as absent.
    pub fn current_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let change = self.inner.borrow();
        match &change.session {
            Some(session) if session.is_expired_at(now) => {
                debug!(user_id = %session.user.id, "stored session has expired");
                None
            }
            other => other.clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    pub fn sign_in(&self, session: Session) {
        self.publish(AuthEvent::SignedIn, Some(session));
    }

    pub fn refresh(&self, session: Session) {
        self.publish(AuthEvent::TokenRefreshed, Some(session));
    }

    pub fn sign_out(&self) {
        self.publish(AuthEvent::SignedOut, None);
    }

    pub fn password_recovery(&self) {
        let session = self.inner.borrow().session.clone();
        self.publish(AuthEvent::PasswordRecovery, session);
    }

    pub fn user_updated(&self, user: User) {
        let session = self.inner.borrow().session.clone().map(|mut session| {
            session.user = user;
            session
        });
        self.publish(AuthEvent::UserUpdated, session);
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.inner.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.receiver_count()
    }

    fn publish(&self, event: AuthEvent, session: Option<Session>) {
        debug!(?event, authenticated = session.is_some(), "auth state changed");
        self.inner.send_replace(AuthChange { event, session });
    }
}

/// Registration for auth change notifications. Dropping it unsubscribes.
pub struct Subscription {
    receiver: watch::Receiver<AuthChange>,
}

impl Subscription {
    /// Waits for the next transition after the last one observed.
    pub async fn changed(&mut self) -> Option<AuthChange> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    pub fn latest(&self) -> AuthChange {
        self.receiver.borrow().clone()
    }

    pub fn unsubscribe(self) {}
}
