use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::notices::NoticeBoard;
use super::residents::ResidentDirectory;

#[derive(Debug, Clone, Default)]
pub struct CommunityBoards {
    pub notices: NoticeBoard,
    pub residents: ResidentDirectory,
}

impl CommunityBoards {
    pub fn standard() -> Self {
        Self {
            notices: NoticeBoard::standard(),
            residents: ResidentDirectory::standard(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DirectoryParams {
    #[serde(default)]
    pub search: Option<String>,
}

pub fn community_router(boards: CommunityBoards) -> Router {
    Router::new()
        .route("/api/v1/notices", get(notices_handler))
        .route("/api/v1/residents", get(residents_handler))
        .with_state(Arc::new(boards))
}

async fn notices_handler(State(boards): State<Arc<CommunityBoards>>) -> Json<Value> {
    let notices: Vec<Value> = boards
        .notices
        .latest()
        .into_iter()
        .map(|notice| {
            let display_date = notice.display_date();
            let mut value = json!(notice);
            value["display_date"] = json!(display_date);
            value
        })
        .collect();
    Json(json!({ "notices": notices }))
}

async fn residents_handler(
    State(boards): State<Arc<CommunityBoards>>,
    Query(params): Query<DirectoryParams>,
) -> Json<Value> {
    let residents = boards
        .residents
        .search(params.search.as_deref().unwrap_or_default());
    Json(json!({ "count": residents.len(), "residents": residents }))
}
