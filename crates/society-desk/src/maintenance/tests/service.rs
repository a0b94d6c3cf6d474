use crate::error::ServiceError;
use crate::gateway::{Gateway, GatewayError};
use crate::maintenance::domain::{
    MaintenancePriority, MaintenanceRequestDraft, MaintenanceStatus, MAINTENANCE_TABLE,
};
use crate::maintenance::filter::FilterCriteria;
use crate::maintenance::repository::RequestRepository;
use crate::maintenance::service::RequestCreationService;

use super::common::{gateway, signed_in_gateway, RESIDENT};

fn leak_draft() -> MaintenanceRequestDraft {
    MaintenanceRequestDraft::new(
        "Leak",
        "Water under sink",
        "Flat 3B",
        MaintenancePriority::High,
    )
}

#[tokio::test]
async fn creates_pending_request_owned_by_current_user() {
    let gateway = signed_in_gateway();
    let service = RequestCreationService::new(gateway.clone());

    let created = service
        .create_request(&leak_draft())
        .await
        .expect("request created");

    assert_eq!(created.title, "Leak");
    assert_eq!(created.location, "Flat 3B");
    assert_eq!(created.status, MaintenanceStatus::Pending);
    assert_eq!(created.priority, MaintenancePriority::High);
    assert_eq!(created.user_id.as_str(), RESIDENT);
    assert!(created.assigned_to.is_none());
    assert!(!created.id.0.is_empty());

    let repository = RequestRepository::new(gateway);
    let listed = repository
        .list_requests(&FilterCriteria::default())
        .await
        .expect("list succeeds");
    assert_eq!(listed.first().map(|request| &request.id), Some(&created.id));

    let stats = repository.get_stats().await.expect("stats succeed");
    assert_eq!(stats.pending, 4);
}

#[tokio::test]
async fn caller_supplied_status_is_ignored() {
    let gateway = signed_in_gateway();
    let service = RequestCreationService::new(gateway.clone());
    let mut draft = leak_draft();
    draft.status = Some(MaintenanceStatus::Completed);

    let created = service.create_request(&draft).await.expect("created");

    assert_eq!(created.status, MaintenanceStatus::Pending);
    let stored = gateway.rows(MAINTENANCE_TABLE);
    assert_eq!(stored.last().and_then(|row| row["status"].as_str()), Some("pending"));
}

#[tokio::test]
async fn blank_fields_are_rejected_before_any_call() {
    let gateway = signed_in_gateway();
    let service = RequestCreationService::new(gateway.clone());
    let mut draft = leak_draft();
    draft.title = "   ".to_string();

    let err = service.create_request(&draft).await.expect_err("invalid");

    assert_eq!(err, ServiceError::Validation("title is required".to_string()));
    assert_eq!(gateway.network_calls(), 0);

    let err = service
        .create_request(&MaintenanceRequestDraft {
            location: String::new(),
            ..leak_draft()
        })
        .await
        .expect_err("invalid");
    assert_eq!(err, ServiceError::Validation("location is required".to_string()));
}

#[tokio::test]
async fn requires_a_session() {
    let gateway = gateway();
    let service = RequestCreationService::new(gateway.clone());

    let err = service
        .create_request(&leak_draft())
        .await
        .expect_err("session required");

    assert!(err.requires_login());
    assert_eq!(gateway.network_calls(), 0);
    assert_eq!(gateway.rows(MAINTENANCE_TABLE).len(), 5);
}

#[tokio::test]
async fn backend_without_user_reports_not_authenticated() {
    let gateway = signed_in_gateway();
    gateway.fail_on(
        "current_user",
        GatewayError::Auth("invalid claim: missing sub claim".to_string()),
    );
    let service = RequestCreationService::new(gateway);

    let err = service
        .create_request(&leak_draft())
        .await
        .expect_err("user rejected");

    assert!(err.requires_login());
}

#[tokio::test]
async fn failed_insert_leaves_draft_and_table_untouched() {
    let gateway = signed_in_gateway();
    gateway.fail_on(
        "insert",
        GatewayError::Network("connection reset by peer".to_string()),
    );
    let service = RequestCreationService::new(gateway.clone());
    let draft = leak_draft();

    let err = service.create_request(&draft).await.expect_err("insert fails");

    assert_eq!(
        err,
        ServiceError::Network("connection reset by peer".to_string())
    );
    assert_eq!(draft, leak_draft());
    assert_eq!(gateway.rows(MAINTENANCE_TABLE).len(), 5);
    assert!(gateway.session().is_some());

    let retried = service.create_request(&draft).await.expect("retry succeeds");
    assert_eq!(retried.title, "Leak");
}
