use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::UserId;

pub const MAINTENANCE_TABLE: &str = "maintenance_requests";

/// Gateway-assigned identifier of a maintenance request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
}

impl MaintenanceStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::Pending, Self::InProgress, Self::Completed]
    }

    /// Wire value stored in the `status` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|status| status.as_str() == raw.trim().to_ascii_lowercase())
    }
}

/// Status column as read back from a row.
///
/// The column is free text on the backend, so values this desk never writes
/// are kept verbatim instead of failing the whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestStatus {
    Known(MaintenanceStatus),
    Other(String),
}

impl RequestStatus {
    pub fn known(&self) -> Option<MaintenanceStatus> {
        match self {
            Self::Known(status) => Some(*status),
            Self::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(status) => status.as_str(),
            Self::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Known(status) => status.label(),
            Self::Other(raw) => raw,
        }
    }
}

impl From<MaintenanceStatus> for RequestStatus {
    fn from(status: MaintenanceStatus) -> Self {
        Self::Known(status)
    }
}

impl PartialEq<MaintenanceStatus> for RequestStatus {
    fn eq(&self, other: &MaintenanceStatus) -> bool {
        self.known() == Some(*other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenancePriority {
    Low,
    Medium,
    High,
}

impl MaintenancePriority {
    pub const fn ordered() -> [Self; 3] {
        [Self::Low, Self::Medium, Self::High]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|priority| priority.as_str() == raw.trim().to_ascii_lowercase())
    }
}

/// Priority column as read back from a row; unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestPriority {
    Known(MaintenancePriority),
    Other(String),
}

impl RequestPriority {
    pub fn known(&self) -> Option<MaintenancePriority> {
        match self {
            Self::Known(priority) => Some(*priority),
            Self::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(priority) => priority.as_str(),
            Self::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Known(priority) => priority.label(),
            Self::Other(raw) => raw,
        }
    }
}

impl From<MaintenancePriority> for RequestPriority {
    fn from(priority: MaintenancePriority) -> Self {
        Self::Known(priority)
    }
}

impl PartialEq<MaintenancePriority> for RequestPriority {
    fn eq(&self, other: &MaintenancePriority) -> bool {
        self.known() == Some(*other)
    }
}

/// Stored row of the `maintenance_requests` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub id: RequestId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: RequestStatus,
    pub priority: RequestPriority,
    pub user_id: UserId,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Form input for a new request.
///
/// `status` is accepted so callers can pass a form through unchanged, but new
/// requests are always stored as pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequestDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub priority: MaintenancePriority,
    #[serde(default)]
    pub status: Option<MaintenanceStatus>,
}

impl MaintenanceRequestDraft {
    pub fn new(title: &str, description: &str, location: &str, priority: MaintenancePriority) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            location: location.to_string(),
            priority,
            status: None,
        }
    }

    /// Name of the first required field left blank, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("title", &self.title),
            ("description", &self.description),
            ("location", &self.location),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

impl Default for MaintenanceRequestDraft {
    fn default() -> Self {
        Self::new("", "", "", MaintenancePriority::Medium)
    }
}

/// Request counts per known status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub pending: u32,
    pub in_progress: u32,
    pub completed: u32,
}

impl StatsSummary {
    /// Counts one row; unknown status values are ignored.
    pub fn record(&mut self, raw_status: &str) {
        match MaintenanceStatus::parse(raw_status) {
            Some(MaintenanceStatus::Pending) => self.pending += 1,
            Some(MaintenanceStatus::InProgress) => self.in_progress += 1,
            Some(MaintenanceStatus::Completed) => self.completed += 1,
            None => {}
        }
    }

    pub fn count(&self, status: MaintenanceStatus) -> u32 {
        match status {
            MaintenanceStatus::Pending => self.pending,
            MaintenanceStatus::InProgress => self.in_progress,
            MaintenanceStatus::Completed => self.completed,
        }
    }

    pub fn total(&self) -> u32 {
        self.pending + self.in_progress + self.completed
    }
}
