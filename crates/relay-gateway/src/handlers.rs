//! HTTP handlers.

use crate::domain::types::{
    parse_record_hit, PlayerScoreResponse, RecordHitResponse, StatusResponse, TopScoreEntry,
    TopScoresResponse,
};
use crate::domain::ApiError;
use crate::service::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use relay_core::{Address, LedgerError};
use tracing::{debug, error, warn};

/// `POST /recordHit`: relay one hit and wait for its confirmation.
pub async fn record_hit(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<RecordHitResponse>, ApiError> {
    let request = parse_record_hit(&body).inspect_err(|e| {
        debug!(error = %e, "Rejected recordHit request");
    })?;

    match state.queue.enqueue(request).wait().await {
        Ok(receipt) => Ok(Json(RecordHitResponse::recorded(receipt.tx_hash))),
        Err(failure) => {
            warn!(
                player = %request.player,
                attempts = failure.attempts,
                error = %failure.error,
                "recordHit failed"
            );
            Err(ApiError::RelayFailed(failure.error.to_string()))
        }
    }
}

pub async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let total_hits = state
        .scoreboard
        .total_hits()
        .await
        .map_err(|e| view_failure("status", e))?;

    Ok(Json(StatusResponse {
        status: "running",
        queue_length: state.queue.backlog_len(),
        total_hits: total_hits.to_string(),
        deployer_address: state.deployer,
    }))
}

pub async fn top_scores(
    State(state): State<AppState>,
) -> Result<Json<TopScoresResponse>, ApiError> {
    let rows = state
        .scoreboard
        .top_scores()
        .await
        .map_err(|e| view_failure("topScores", e))?;

    Ok(Json(TopScoresResponse {
        top_scores: rows.into_iter().map(TopScoreEntry::from).collect(),
    }))
}

pub async fn player_score(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<PlayerScoreResponse>, ApiError> {
    let player: Address = address
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid player address"))?;
    let score = state
        .scoreboard
        .player_score(&player)
        .await
        .map_err(|e| view_failure("playerScore", e))?;

    Ok(Json(PlayerScoreResponse::from(score)))
}

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "relay-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn view_failure(endpoint: &'static str, e: LedgerError) -> ApiError {
    error!(endpoint, error = %e, "Contract read failed");
    ApiError::Internal
}
