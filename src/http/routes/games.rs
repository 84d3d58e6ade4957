use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::catalog::{self, SearchQuery};
use crate::database::GameResponse;
use crate::global::Global;
use crate::http::error::ApiError;

pub fn routes() -> Router<Arc<Global>> {
    Router::new()
        .route("/search", post(search_games))
        .route("/populate", get(populate_games))
}

/// POST /search
///
/// Body `{ "name"?: string, "platform"?: string }`. An empty body searches
/// without filters.
#[tracing::instrument(skip_all)]
async fn search_games(
    State(global): State<Arc<Global>>,
    body: Bytes,
) -> Result<Json<Vec<GameResponse>>, ApiError> {
    let query = if body.iter().all(u8::is_ascii_whitespace) {
        SearchQuery::default()
    } else {
        serde_json::from_slice::<SearchQuery>(&body).map_err(|e| {
            tracing::warn!(error = %e, "rejected search body");
            ApiError::bad_request("Invalid search body")
        })?
    };

    let games = catalog::search(global.store.as_ref(), &query)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "search failed");
            ApiError::internal_server_error("Search failed")
        })?;

    Ok(Json(games.into_iter().map(Into::into).collect()))
}

#[derive(Debug, serde::Serialize)]
struct PopulateResponse {
    message: &'static str,
    /// Entries fetched from both feeds, including ones that were already stored.
    count: usize,
}

/// GET /populate
#[tracing::instrument(skip_all)]
async fn populate_games(State(global): State<Arc<Global>>) -> Result<Json<PopulateResponse>, ApiError> {
    let report = catalog::populate(&global.feeds, global.store.as_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "error populating games");
            ApiError::internal_server_error("Failed to populate games")
        })?;

    Ok(Json(PopulateResponse {
        message: "Games populated successfully",
        count: report.considered,
    }))
}
