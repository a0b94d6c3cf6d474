use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use super::domain::{
    MaintenanceRequest, MaintenanceRequestDraft, MaintenanceStatus, MAINTENANCE_TABLE,
};
use crate::error::ServiceError;
use crate::gateway::{Gateway, GatewayError};
use crate::session::SessionGuard;

/// Submits new maintenance requests on behalf of the signed-in resident.
pub struct RequestCreationService<G: ?Sized> {
    gateway: Arc<G>,
    guard: SessionGuard<G>,
}

impl<G: ?Sized> Clone for RequestCreationService<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            guard: self.guard.clone(),
        }
    }
}

impl<G> RequestCreationService<G>
where
    G: Gateway + ?Sized,
{
    pub fn new(gateway: Arc<G>) -> Self {
        let guard = SessionGuard::new(Arc::clone(&gateway));
        Self { gateway, guard }
    }

    /// Stores `draft` as a new pending request owned by the current user.
    ///
    /// The draft is borrowed so a failed submission leaves the form intact.
    /// Callers refetch the list and stats after success to observe the row.
    pub async fn create_request(
        &self,
        draft: &MaintenanceRequestDraft,
    ) -> Result<MaintenanceRequest, ServiceError> {
        if let Some(field) = draft.missing_field() {
            return Err(ServiceError::Validation(format!("{field} is required")));
        }

        let user = self.guard.require_user().await?;

        let row = json!({
            "title": draft.title,
            "description": draft.description,
            "location": draft.location,
            "priority": draft.priority.as_str(),
            "status": MaintenanceStatus::Pending.as_str(),
            "user_id": user.id,
        });

        let stored = self
            .gateway
            .insert(MAINTENANCE_TABLE, row)
            .await
            .map_err(|err| {
                let err = ServiceError::from(err);
                warn!(error = %err, "maintenance request insert failed");
                err
            })?;

        let request: MaintenanceRequest = serde_json::from_value(stored)
            .map_err(|err| ServiceError::from(GatewayError::from(err)))?;

        info!(
            request_id = %request.id.0,
            user_id = %request.user_id,
            priority = request.priority.as_str(),
            "maintenance request created"
        );
        Ok(request)
    }
}
