//! Search handler.

use super::SearchRequest;
use crate::api::AppState;
use crate::error::Error;
use crate::types::AppRecord;
use axum::{Json, extract::State};

/// POST /search - Search one or both stores for apps
#[utoipa::path(
    post,
    path = "/search",
    tag = "search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matching apps, most relevant first", body = Vec<AppRecord>),
        (status = 400, description = "Invalid search request"),
        (status = 502, description = "Upstream store failure")
    )
)]
pub async fn search_apps(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<AppRecord>>, Error> {
    let records = state
        .hunter
        .search(&request.term, request.store, request.country, request.limit)
        .await?;

    tracing::debug!(term = %request.term, results = records.len(), "Search served");
    Ok(Json(records))
}
