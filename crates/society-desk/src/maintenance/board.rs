use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::debug;

use super::domain::{MaintenanceRequest, MaintenanceRequestDraft, StatsSummary};
use super::filter::{FilterCriteria, FilterModel};
use super::repository::RequestRepository;
use super::service::RequestCreationService;
use crate::error::ServiceError;
use crate::gateway::Gateway;

/// What the maintenance screen renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub requests: Vec<MaintenanceRequest>,
    pub stats: StatsSummary,
    pub loading: bool,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
    /// Generation of the refresh whose results are shown.
    pub generation: u64,
}

/// Stamp handed out when a refresh starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Results of one list + stats round trip.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub requests: Result<Vec<MaintenanceRequest>, ServiceError>,
    pub stats: Result<StatsSummary, ServiceError>,
}

/// Screen-level controller for the maintenance tracker.
///
/// Every refresh is stamped with a generation; a result only lands if no newer
/// refresh started in the meantime, so a slow earlier fetch can never
/// overwrite a faster later one.
pub struct MaintenanceBoard<G: ?Sized> {
    repository: RequestRepository<G>,
    creator: RequestCreationService<G>,
    filters: Mutex<FilterModel>,
    generation: AtomicU64,
    view: Mutex<BoardView>,
}

impl<G> MaintenanceBoard<G>
where
    G: Gateway + ?Sized,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            repository: RequestRepository::new(Arc::clone(&gateway)),
            creator: RequestCreationService::new(gateway),
            filters: Mutex::new(FilterModel::default()),
            generation: AtomicU64::new(0),
            view: Mutex::new(BoardView::default()),
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.filters
            .lock()
            .expect("filter mutex poisoned")
            .criteria()
            .clone()
    }

    pub fn view(&self) -> BoardView {
        self.view.lock().expect("view mutex poisoned").clone()
    }

    /// Replaces the filters and refetches when they changed.
    pub async fn apply_filters(&self, criteria: FilterCriteria) -> BoardView {
        let changed = self
            .filters
            .lock()
            .expect("filter mutex poisoned")
            .set(criteria);
        if changed {
            self.refresh().await
        } else {
            self.view()
        }
    }

    pub async fn reset_filters(&self) -> BoardView {
        let changed = self.filters.lock().expect("filter mutex poisoned").reset();
        if changed {
            self.refresh().await
        } else {
            self.view()
        }
    }

    pub async fn refresh(&self) -> BoardView {
        let ticket = self.begin_refresh();
        let criteria = self.criteria();
        let outcome = self.fetch(&criteria).await;
        self.complete_refresh(ticket, outcome);
        self.view()
    }

    pub fn begin_refresh(&self) -> RefreshTicket {
        let mut view = self.view.lock().expect("view mutex poisoned");
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        view.loading = true;
        view.error = None;
        view.redirect = None;
        RefreshTicket(generation)
    }

    pub async fn fetch(&self, criteria: &FilterCriteria) -> RefreshOutcome {
        let (requests, stats) = tokio::join!(
            self.repository.list_requests(criteria),
            self.repository.get_stats()
        );
        RefreshOutcome { requests, stats }
    }

    /// Applies `outcome` unless a newer refresh has started; returns whether
    /// it was applied.
    ///
    /// The generation is only bumped or compared under the view lock.
    pub fn complete_refresh(&self, ticket: RefreshTicket, outcome: RefreshOutcome) -> bool {
        let mut view = self.view.lock().expect("view mutex poisoned");
        let latest = self.generation.load(Ordering::SeqCst);
        if ticket.0 != latest {
            debug!(
                stale = ticket.0,
                latest, "discarding out-of-date maintenance refresh"
            );
            return false;
        }

        view.loading = false;
        view.generation = ticket.0;

        match outcome.requests {
            Ok(requests) => view.requests = requests,
            Err(err) => record_error(&mut view, &err),
        }
        match outcome.stats {
            Ok(stats) => view.stats = stats,
            Err(err) => {
                if view.error.is_none() {
                    record_error(&mut view, &err);
                }
            }
        }
        true
    }

    /// Submits the draft and refetches on success. The draft stays with the
    /// caller so a failed submission can be retried as is.
    pub async fn submit(
        &self,
        draft: &MaintenanceRequestDraft,
    ) -> Result<MaintenanceRequest, ServiceError> {
        match self.creator.create_request(draft).await {
            Ok(created) => {
                self.refresh().await;
                Ok(created)
            }
            Err(err) => {
                record_error(&mut self.view.lock().expect("view mutex poisoned"), &err);
                Err(err)
            }
        }
    }
}

fn record_error(view: &mut BoardView, err: &ServiceError) {
    view.error = Some(err.to_string());
    if let Some(redirect) = err.redirect() {
        view.redirect = Some(redirect);
    }
}
