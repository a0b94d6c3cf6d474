use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use society_desk::account::{AccountService, PROFILES_TABLE};
use society_desk::config::AppConfig;
use society_desk::error::{AppError, ServiceError};
use society_desk::gateway::{Gateway, InMemoryGateway, RestGateway};
use society_desk::maintenance::MAINTENANCE_TABLE;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) const DEMO_USER_ID: &str = "demo-resident";
pub(crate) const DEMO_EMAIL: &str = "resident@example.com";
pub(crate) const DEMO_PASSWORD: &str = "society-demo";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Backend used by the server and CLI commands.
///
/// A configured hosted backend wins; without one the desk runs against a
/// seeded in-memory backend signed in as the demo resident.
pub(crate) async fn connect_gateway(config: &AppConfig) -> Result<Arc<dyn Gateway>, AppError> {
    let Some(gateway_config) = &config.gateway else {
        warn!("APP_GATEWAY_URL not set; using the in-memory demo backend");
        let gateway: Arc<dyn Gateway> = demo_gateway();
        return Ok(gateway);
    };

    let gateway = RestGateway::new(gateway_config).map_err(ServiceError::from)?;
    let gateway: Arc<dyn Gateway> = Arc::new(gateway);
    info!(base_url = %gateway_config.base_url, "using hosted backend");

    if let Some(credentials) = &config.account.credentials {
        let accounts = AccountService::new(Arc::clone(&gateway), &config.account);
        accounts
            .sign_in(&credentials.email, &credentials.password)
            .await?;
    } else {
        warn!("APP_DESK_EMAIL not set; protected endpoints will ask for sign-in");
    }

    Ok(gateway)
}

/// In-memory backend seeded with a resident, a profile and a handful of
/// maintenance requests.
pub(crate) fn demo_gateway() -> Arc<InMemoryGateway> {
    let gateway = InMemoryGateway::new();
    gateway.register_user(DEMO_USER_ID, DEMO_EMAIL, DEMO_PASSWORD);
    gateway.seed(
        PROFILES_TABLE,
        [json!({
            "id": DEMO_USER_ID,
            "updated_at": "2024-02-01T09:00:00Z",
            "username": "resident",
            "full_name": "Demo Resident",
            "avatar_url": null,
            "flat_number": "A-101",
        })],
    );
    gateway.seed(
        MAINTENANCE_TABLE,
        [
            demo_request(
                "demo-1",
                "Leaking tap",
                "Bathroom tap drips all night",
                "Flat A-101",
                "pending",
                "high",
                "2024-02-01T09:00:00Z",
            ),
            demo_request(
                "demo-2",
                "Broken lift",
                "Lift stuck on floor 3",
                "Tower B",
                "in_progress",
                "high",
                "2024-02-03T10:00:00Z",
            ),
            demo_request(
                "demo-3",
                "Corridor light",
                "Light flickers near the stairs",
                "Floor 4",
                "completed",
                "low",
                "2024-02-05T18:30:00Z",
            ),
        ],
    );
    gateway.sign_in_as(DEMO_USER_ID);
    Arc::new(gateway)
}

fn demo_request(
    id: &str,
    title: &str,
    description: &str,
    location: &str,
    status: &str,
    priority: &str,
    created_at: &str,
) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": description,
        "location": location,
        "status": status,
        "priority": priority,
        "user_id": DEMO_USER_ID,
        "assigned_to": null,
        "created_at": created_at,
        "updated_at": created_at,
        "completed_at": if status == "completed" { json!(created_at) } else { json!(null) },
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_gateway_starts_signed_in() {
        let gateway = demo_gateway();
        let session = gateway.session().expect("demo session");
        assert_eq!(session.user.id.as_str(), DEMO_USER_ID);
        assert_eq!(gateway.rows(MAINTENANCE_TABLE).len(), 3);
    }

    #[test]
    fn parse_date_reports_bad_input() {
        assert!(parse_date("2024-02-10").is_ok());
        let err = parse_date("tomorrow").expect_err("invalid");
        assert!(err.contains("tomorrow"));
    }
}
