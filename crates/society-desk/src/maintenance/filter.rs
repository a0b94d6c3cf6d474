use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{MaintenancePriority, MaintenanceStatus};
use crate::error::ServiceError;
use crate::gateway::Predicate;

const CREATED_AT: &str = "created_at";

/// Status selector; `All` applies no predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(MaintenanceStatus),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        match raw.trim() {
            "" | "all" => Ok(Self::All),
            other => MaintenanceStatus::parse(other)
                .map(Self::Only)
                .ok_or_else(|| ServiceError::Validation(format!("unknown status filter '{other}'"))),
        }
    }
}

/// Priority selector; `All` applies no predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(MaintenancePriority),
}

impl PriorityFilter {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        match raw.trim() {
            "" | "all" => Ok(Self::All),
            other => MaintenancePriority::parse(other)
                .map(Self::Only)
                .ok_or_else(|| {
                    ServiceError::Validation(format!("unknown priority filter '{other}'"))
                }),
        }
    }
}

/// Active filter selection of the maintenance screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub status: StatusFilter,
    pub priority: PriorityFilter,
    pub search: String,
    /// Inclusive lower bound on `created_at`.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on `created_at`.
    pub date_to: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn with_status(mut self, status: MaintenanceStatus) -> Self {
        self.status = StatusFilter::Only(status);
        self
    }

    pub fn with_priority(mut self, priority: MaintenancePriority) -> Self {
        self.priority = PriorityFilter::Only(priority);
        self
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = search.to_string();
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Conjunction of every active predicate.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if let StatusFilter::Only(status) = self.status {
            predicates.push(Predicate::eq("status", status.as_str()));
        }
        if let PriorityFilter::Only(priority) = self.priority {
            predicates.push(Predicate::eq("priority", priority.as_str()));
        }

        let search = self.search.trim();
        if !search.is_empty() {
            predicates.push(Predicate::any(vec![
                Predicate::ilike("title", search),
                Predicate::ilike("description", search),
            ]));
        }

        if let Some(from) = self.date_from {
            predicates.push(Predicate::gte(CREATED_AT, start_of_day(from)));
        }
        if let Some(to) = self.date_to {
            predicates.push(match to.succ_opt() {
                Some(next) => Predicate::lt(CREATED_AT, start_of_day(next)),
                None => Predicate::lte(CREATED_AT, format!("{to}T23:59:59.999999Z")),
            });
        }

        predicates
    }
}

fn start_of_day(date: NaiveDate) -> String {
    format!("{date}T00:00:00Z")
}

/// Parses a date bound typed by a resident; blank input means unbounded.
pub fn parse_date_bound(raw: &str) -> Result<Option<NaiveDate>, ServiceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ServiceError::Validation(format!("'{trimmed}' is not a YYYY-MM-DD date")))
}

/// Holds the single active [`FilterCriteria`] of a screen.
#[derive(Debug, Clone, Default)]
pub struct FilterModel {
    criteria: FilterCriteria,
}

impl FilterModel {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Replaces the criteria; returns whether anything changed.
    pub fn set(&mut self, criteria: FilterCriteria) -> bool {
        let changed = self.criteria != criteria;
        self.criteria = criteria;
        changed
    }

    pub fn reset(&mut self) -> bool {
        self.set(FilterCriteria::default())
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        self.criteria.predicates()
    }
}

/// Query-string shape of the filter form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilterParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, alias = "dateFrom")]
    pub date_from: Option<String>,
    #[serde(default, alias = "dateTo")]
    pub date_to: Option<String>,
}

impl TryFrom<FilterParams> for FilterCriteria {
    type Error = ServiceError;

    fn try_from(params: FilterParams) -> Result<Self, Self::Error> {
        Ok(Self {
            status: StatusFilter::parse(params.status.as_deref().unwrap_or_default())?,
            priority: PriorityFilter::parse(params.priority.as_deref().unwrap_or_default())?,
            search: params.search.unwrap_or_default(),
            date_from: parse_date_bound(params.date_from.as_deref().unwrap_or_default())?,
            date_to: parse_date_bound(params.date_to.as_deref().unwrap_or_default())?,
        })
    }
}
