//! Maintenance request tracker: filtering, listing, per-status stats and
//! creation against the backend's `maintenance_requests` table.

pub mod board;
pub mod domain;
pub mod filter;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use board::{BoardView, MaintenanceBoard, RefreshOutcome, RefreshTicket};
pub use domain::{
    MaintenancePriority, MaintenanceRequest, MaintenanceRequestDraft, MaintenanceStatus,
    RequestId, RequestPriority, RequestStatus, StatsSummary, MAINTENANCE_TABLE,
};
pub use filter::{
    parse_date_bound, FilterCriteria, FilterModel, FilterParams, PriorityFilter, StatusFilter,
};
pub use repository::RequestRepository;
pub use router::{maintenance_router, MaintenanceRoutes};
pub use service::RequestCreationService;
