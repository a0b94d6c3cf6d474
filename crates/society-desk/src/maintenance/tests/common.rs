use std::sync::Arc;

use axum::response::Response;
use serde_json::{json, Value};

use crate::gateway::InMemoryGateway;
use crate::maintenance::domain::{MaintenanceRequest, MAINTENANCE_TABLE};

pub(super) const RESIDENT: &str = "u1";

pub(super) fn request_row(
    id: &str,
    title: &str,
    description: &str,
    status: &str,
    priority: &str,
    created_at: &str,
) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": description,
        "location": "Block C",
        "status": status,
        "priority": priority,
        "user_id": RESIDENT,
        "assigned_to": null,
        "created_at": created_at,
        "updated_at": created_at,
        "completed_at": null,
    })
}

/// Three pending, one in progress and one completed request.
pub(super) fn dataset() -> Vec<Value> {
    vec![
        request_row(
            "r1",
            "Leaking tap",
            "Bathroom tap drips all night",
            "pending",
            "high",
            "2024-02-01T09:00:00Z",
        ),
        request_row(
            "r2",
            "Broken lift",
            "Lift stuck on floor 3",
            "in_progress",
            "high",
            "2024-02-03T10:00:00Z",
        ),
        request_row(
            "r3",
            "Corridor light",
            "Light flickers near the STAIRS",
            "pending",
            "low",
            "2024-02-05T18:30:00Z",
        ),
        request_row(
            "r4",
            "Gate hinge",
            "Main gate squeaks",
            "completed",
            "medium",
            "2024-02-07T07:15:00Z",
        ),
        request_row(
            "r5",
            "Sink blocked",
            "Kitchen sink drains slowly",
            "pending",
            "medium",
            "2024-02-10T12:00:00Z",
        ),
    ]
}

pub(super) fn gateway() -> Arc<InMemoryGateway> {
    let gateway = InMemoryGateway::new();
    gateway.register_user(RESIDENT, "asha@example.com", "secret123");
    gateway.seed(MAINTENANCE_TABLE, dataset());
    Arc::new(gateway)
}

pub(super) fn signed_in_gateway() -> Arc<InMemoryGateway> {
    let gateway = gateway();
    gateway.sign_in_as(RESIDENT);
    gateway
}

pub(super) fn ids(requests: &[MaintenanceRequest]) -> Vec<&str> {
    requests.iter().map(|request| request.id.0.as_str()).collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
