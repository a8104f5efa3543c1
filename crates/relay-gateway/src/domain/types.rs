//! Request and response bodies.
//!
//! Large integers (scores, timestamps, hit totals) are sent as decimal
//! strings so that JSON clients never lose precision.

use super::error::ApiError;
use relay_core::{Address, PlayerScore, Points, PointsOutOfRange, RelayRequest, TopScore, TxHash};
use serde::Serialize;
use serde_json::Value;

pub const HIT_RECORDED: &str = "Hit recorded successfully";

/// Validate a raw `/recordHit` body.
///
/// `points` may be a JSON integer or a decimal string.
pub fn parse_record_hit(body: &str) -> Result<RelayRequest, ApiError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))?;
    let Value::Object(fields) = value else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };

    let player = match fields.get("player") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim(),
        Some(Value::Null) | None => return Err(missing_fields()),
        Some(Value::String(_)) => return Err(missing_fields()),
        Some(_) => return Err(ApiError::bad_request("Invalid player address")),
    };
    let raw_points = match fields.get("points") {
        Some(Value::Null) | None => return Err(missing_fields()),
        Some(points) => parse_points(points)?,
    };

    let player: Address = player
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid player address"))?;
    let points = Points::new(raw_points).map_err(points_error)?;
    Ok(RelayRequest::new(player, points))
}

fn missing_fields() -> ApiError {
    ApiError::bad_request("Missing required fields")
}

fn parse_points(value: &Value) -> Result<i128, ApiError> {
    let not_integer = || ApiError::bad_request("Points must be an integer");
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .ok_or_else(not_integer),
        Value::String(s) => s.trim().parse::<i128>().map_err(|_| not_integer()),
        _ => Err(not_integer()),
    }
}

fn points_error(err: PointsOutOfRange) -> ApiError {
    if err.value < 0 {
        ApiError::bad_request("Points cannot be negative")
    } else {
        ApiError::bad_request(format!("Points cannot exceed {}", err.max))
    }
}

#[derive(Debug, Serialize)]
pub struct RecordHitResponse {
    pub success: bool,
    pub hash: TxHash,
    pub message: &'static str,
}

impl RecordHitResponse {
    pub fn recorded(hash: TxHash) -> Self {
        Self {
            success: true,
            hash,
            message: HIT_RECORDED,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: &'static str,
    pub queue_length: usize,
    pub total_hits: String,
    pub deployer_address: Address,
}

#[derive(Debug, Serialize)]
pub struct TopScoreEntry {
    pub player: Address,
    pub score: String,
    pub timestamp: String,
}

impl From<TopScore> for TopScoreEntry {
    fn from(row: TopScore) -> Self {
        Self {
            player: row.player,
            score: row.score.to_string(),
            timestamp: row.timestamp.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopScoresResponse {
    pub top_scores: Vec<TopScoreEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerScoreResponse {
    pub player: Address,
    pub total_score: String,
    pub hit_count: usize,
}

impl From<PlayerScore> for PlayerScoreResponse {
    fn from(score: PlayerScore) -> Self {
        Self {
            player: score.player,
            total_score: score.total_score.to_string(),
            hit_count: score.hit_count,
        }
    }
}
