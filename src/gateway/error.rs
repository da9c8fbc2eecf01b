use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::gateway::validate::ValidationError;
use crate::ranking::{RankedScreen, RankingError};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    InvalidRequest(#[from] ValidationError),

    #[error("ranking failed: {0}")]
    RankingFailed(#[from] RankingError),

    #[error("internal error: {0}")]
    InternalError(String),
}

/// Error body: always carries an empty `results` array so callers can
/// consume success and failure responses with one shape.
#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub results: Vec<RankedScreen>,
    pub error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        // Client input errors get 400; embedding/internal failures get 500.
        let status = match &self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::RankingFailed(_) | GatewayError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            results: vec![],
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
