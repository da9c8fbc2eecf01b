use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;
use crate::gateway::validate::validate_request;
use crate::ranking::RankedScreen;

/// Success body for `POST /recommend`.
#[derive(serde::Serialize)]
pub struct RecommendResponse {
    pub results: Vec<RankedScreen>,
}

/// Ranks the submitted screens against the advertiser text.
///
/// Validation runs before any embedding work; a rejected request costs no
/// inference. The embed/score/sort pass runs on the blocking pool so model
/// inference does not stall the async workers, but the request is still a
/// single synchronous pass from the caller's perspective.
#[instrument(skip(state, payload))]
pub async fn recommend_handler(
    State(state): State<HandlerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RecommendResponse>, GatewayError> {
    let payload = payload.ok().map(|Json(value)| value);

    let (advertiser_text, screens) =
        validate_request(payload.as_ref()).inspect_err(|reason| {
            warn!(%reason, "Rejected recommendation request");
        })?;

    info!(
        query_len = advertiser_text.len(),
        screen_count = screens.len(),
        "Recommendation request"
    );
    debug!(advertiser_text = %advertiser_text, "Advertiser input text");

    let engine = state.engine.clone();
    let results = tokio::task::spawn_blocking(move || engine.rank(&advertiser_text, screens))
        .await
        .map_err(|e| GatewayError::InternalError(format!("ranking task failed: {e}")))??;

    Ok(Json(RecommendResponse { results }))
}
