use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::domain::{MaintenanceRequest, MaintenanceStatus, StatsSummary, MAINTENANCE_TABLE};
use super::filter::FilterCriteria;
use crate::error::ServiceError;
use crate::gateway::{Gateway, GatewayError, Predicate, Query};
use crate::session::SessionGuard;

/// Read side of the maintenance tracker. Every call goes to the gateway;
/// nothing is cached between calls.
pub struct RequestRepository<G: ?Sized> {
    gateway: Arc<G>,
    guard: SessionGuard<G>,
}

impl<G: ?Sized> Clone for RequestRepository<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            guard: self.guard.clone(),
        }
    }
}

impl<G> RequestRepository<G>
where
    G: Gateway + ?Sized,
{
    pub fn new(gateway: Arc<G>) -> Self {
        let guard = SessionGuard::new(Arc::clone(&gateway));
        Self { gateway, guard }
    }

    /// Requests matching `criteria`, newest first.
    pub async fn list_requests(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<MaintenanceRequest>, ServiceError> {
        self.guard.require_session()?;

        let query = Query::from(MAINTENANCE_TABLE)
            .filters(criteria.predicates())
            .order_desc("created_at");

        let rows = self
            .gateway
            .query(&query)
            .await
            .map_err(|err| surface("list maintenance requests", err))?;

        let requests = rows
            .into_iter()
            .map(serde_json::from_value::<MaintenanceRequest>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| surface("list maintenance requests", err.into()))?;

        debug!(count = requests.len(), "maintenance requests fetched");
        Ok(requests)
    }

    /// Per-status counts across every request with a known status.
    pub async fn get_stats(&self) -> Result<StatsSummary, ServiceError> {
        self.guard.require_session()?;

        let known = MaintenanceStatus::ordered().map(MaintenanceStatus::as_str);
        let query = Query::from(MAINTENANCE_TABLE)
            .select(&["status"])
            .filter(Predicate::one_of("status", known));

        let rows = self
            .gateway
            .query(&query)
            .await
            .map_err(|err| surface("fetch maintenance stats", err))?;

        let mut stats = StatsSummary::default();
        for row in &rows {
            if let Some(status) = row.get("status").and_then(Value::as_str) {
                stats.record(status);
            }
        }

        debug!(
            pending = stats.pending,
            in_progress = stats.in_progress,
            completed = stats.completed,
            "maintenance stats aggregated"
        );
        Ok(stats)
    }
}

fn surface(action: &'static str, err: GatewayError) -> ServiceError {
    let err = ServiceError::from(err);
    warn!(action, error = %err, reauth = err.requires_login(), "maintenance call failed");
    err
}
