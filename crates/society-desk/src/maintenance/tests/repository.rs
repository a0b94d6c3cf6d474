use chrono::NaiveDate;

use crate::error::ServiceError;
use crate::gateway::{Gateway, GatewayError};
use crate::maintenance::domain::{
    MaintenancePriority, MaintenanceStatus, RequestPriority, RequestStatus, MAINTENANCE_TABLE,
};
use crate::maintenance::filter::FilterCriteria;
use crate::maintenance::repository::RequestRepository;
use crate::session::LOGIN_ROUTE;

use super::common::{gateway, ids, request_row, signed_in_gateway};

#[tokio::test]
async fn lists_every_request_newest_first() {
    let repository = RequestRepository::new(signed_in_gateway());

    let requests = repository
        .list_requests(&FilterCriteria::default())
        .await
        .expect("list succeeds");

    assert_eq!(ids(&requests), vec!["r5", "r4", "r3", "r2", "r1"]);
    assert!(requests
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
}

#[tokio::test]
async fn status_filter_keeps_only_matching_rows() {
    let repository = RequestRepository::new(signed_in_gateway());

    let requests = repository
        .list_requests(&FilterCriteria::default().with_status(MaintenanceStatus::Pending))
        .await
        .expect("list succeeds");

    assert_eq!(ids(&requests), vec!["r5", "r3", "r1"]);
    assert!(requests
        .iter()
        .all(|request| request.status == MaintenanceStatus::Pending));
}

#[tokio::test]
async fn search_hits_title_or_description() {
    let repository = RequestRepository::new(signed_in_gateway());

    let requests = repository
        .list_requests(&FilterCriteria::default().with_search("sink"))
        .await
        .expect("list succeeds");
    assert_eq!(ids(&requests), vec!["r5"]);

    let requests = repository
        .list_requests(
            &FilterCriteria::default()
                .with_search("T")
                .with_priority(MaintenancePriority::High),
        )
        .await
        .expect("list succeeds");
    for request in &requests {
        let haystack = format!("{} {}", request.title, request.description).to_lowercase();
        assert!(haystack.contains('t'));
        assert_eq!(request.priority, MaintenancePriority::High);
    }
    assert_eq!(ids(&requests), vec!["r2", "r1"]);
}

#[tokio::test]
async fn date_range_is_inclusive_of_both_days() {
    let repository = RequestRepository::new(signed_in_gateway());
    let from = NaiveDate::from_ymd_opt(2024, 2, 3);
    let to = NaiveDate::from_ymd_opt(2024, 2, 7);

    let requests = repository
        .list_requests(&FilterCriteria::default().with_date_range(from, to))
        .await
        .expect("list succeeds");

    assert_eq!(ids(&requests), vec!["r4", "r3", "r2"]);
}

#[tokio::test]
async fn empty_result_is_not_an_error() {
    let repository = RequestRepository::new(signed_in_gateway());

    let requests = repository
        .list_requests(&FilterCriteria::default().with_search("chimney"))
        .await
        .expect("list succeeds");

    assert!(requests.is_empty());
}

#[tokio::test]
async fn stats_count_each_known_status() {
    let repository = RequestRepository::new(signed_in_gateway());

    let stats = repository.get_stats().await.expect("stats succeed");

    assert_eq!(stats.pending, 3);
    assert_eq!(stats.in_progress, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.total(), 5);
}

#[tokio::test]
async fn stats_ignore_unknown_statuses() {
    let gateway = signed_in_gateway();
    gateway.seed(
        MAINTENANCE_TABLE,
        [request_row(
            "r6",
            "Old ticket",
            "Imported from the previous system",
            "archived",
            "low",
            "2024-01-15T08:00:00Z",
        )],
    );
    let repository = RequestRepository::new(gateway);

    let stats = repository.get_stats().await.expect("stats succeed");

    assert_eq!(stats.total(), 5);
    assert_eq!(stats.count(MaintenanceStatus::Pending), 3);
}

#[tokio::test]
async fn listing_keeps_rows_with_unrecognised_values() {
    let gateway = signed_in_gateway();
    gateway.seed(
        MAINTENANCE_TABLE,
        [
            request_row(
                "r6",
                "Old ticket",
                "Imported from the previous system",
                "archived",
                "low",
                "2024-01-15T08:00:00Z",
            ),
            request_row(
                "r7",
                "Water tank overflow",
                "Terrace tank spilling onto stairs",
                "in_progress",
                "urgent",
                "2024-02-12T07:30:00Z",
            ),
        ],
    );
    let repository = RequestRepository::new(gateway);

    let requests = repository
        .list_requests(&FilterCriteria::default())
        .await
        .expect("list succeeds");

    assert_eq!(ids(&requests), vec!["r7", "r5", "r4", "r3", "r2", "r1", "r6"]);
    let archived = &requests[6];
    assert_eq!(archived.status, RequestStatus::Other("archived".to_string()));
    assert_eq!(archived.status.label(), "archived");
    assert_eq!(archived.priority, MaintenancePriority::Low);
    let overflow = &requests[0];
    assert_eq!(overflow.status, MaintenanceStatus::InProgress);
    assert_eq!(overflow.priority, RequestPriority::Other("urgent".to_string()));
    assert_eq!(overflow.priority.known(), None);

    let stats = repository.get_stats().await.expect("stats succeed");
    assert_eq!(stats.total(), 6);
    assert_eq!(stats.count(MaintenanceStatus::InProgress), 2);
}

#[tokio::test]
async fn stats_ignore_active_filters() {
    let gateway = signed_in_gateway();
    let repository = RequestRepository::new(gateway);

    let filtered = repository
        .list_requests(&FilterCriteria::default().with_status(MaintenanceStatus::Completed))
        .await
        .expect("list succeeds");
    let stats = repository.get_stats().await.expect("stats succeed");

    assert_eq!(filtered.len(), 1);
    assert_eq!(stats.total(), 5);
}

#[tokio::test]
async fn missing_session_fails_without_network_call() {
    let gateway = gateway();
    let repository = RequestRepository::new(gateway.clone());

    let err = repository
        .list_requests(&FilterCriteria::default())
        .await
        .expect_err("session required");
    assert_eq!(err, ServiceError::no_session());
    assert_eq!(err.redirect(), Some(LOGIN_ROUTE));

    let err = repository.get_stats().await.expect_err("session required");
    assert!(err.requires_login());
    assert_eq!(gateway.network_calls(), 0);
}

#[tokio::test]
async fn rejected_token_redirects_to_login() {
    let gateway = signed_in_gateway();
    gateway.fail_next(GatewayError::Network("JWT expired".to_string()));
    let repository = RequestRepository::new(gateway);

    let err = repository
        .list_requests(&FilterCriteria::default())
        .await
        .expect_err("token rejected");

    assert_eq!(
        err,
        ServiceError::AuthenticationRequired {
            reason: "JWT expired".to_string()
        }
    );
    assert_eq!(err.redirect(), Some(LOGIN_ROUTE));
}

#[tokio::test]
async fn network_failure_surfaces_message() {
    let gateway = signed_in_gateway();
    gateway.fail_on(
        "query",
        GatewayError::Network("connection refused".to_string()),
    );
    let repository = RequestRepository::new(gateway);

    let err = repository.get_stats().await.expect_err("network down");

    assert_eq!(err, ServiceError::Network("connection refused".to_string()));
    assert_eq!(err.redirect(), None);
}

#[tokio::test]
async fn expired_session_reads_as_signed_out() {
    let gateway = gateway();
    let mut session = gateway.sign_in_as("u1");
    session.expires_at = chrono::Utc::now() - chrono::Duration::minutes(5);
    gateway.sessions().refresh(session);
    let repository = RequestRepository::new(gateway.clone());

    let err = repository
        .list_requests(&FilterCriteria::default())
        .await
        .expect_err("expired session");

    assert!(err.requires_login());
    assert_eq!(gateway.network_calls(), 0);
}
