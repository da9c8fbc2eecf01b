//! Request validation.
//!
//! Structural checks run before any embedding work, in a fixed order with
//! the first failure winning: payload present, query text present,
//! candidate list non-empty. Per-screen `text` is deliberately lenient — a
//! missing or non-string text becomes the empty string and simply scores
//! low, it does not reject the request.

use serde_json::Value;
use thiserror::Error;

use crate::ranking::ScreenCandidate;

/// Why a request was rejected before ranking. One kind per rejection;
/// failures are not accumulated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Body absent, unparseable, or not a non-empty JSON object.
    #[error("No JSON data provided")]
    MissingPayload,

    /// `advertiser_text` missing, non-string, or empty.
    #[error("advertiser_text is required")]
    MissingQuery,

    /// `screens` missing, not an array, or empty.
    #[error("screens list is required and cannot be empty")]
    EmptyCandidateList,
}

/// Validates a raw payload into a typed `(query, screens)` pair.
///
/// `payload` is `None` when the body was absent or failed to parse as JSON.
pub fn validate_request(
    payload: Option<&Value>,
) -> Result<(String, Vec<ScreenCandidate>), ValidationError> {
    let data = match payload {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => return Err(ValidationError::MissingPayload),
    };

    let advertiser_text = match data.get("advertiser_text").and_then(Value::as_str) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => return Err(ValidationError::MissingQuery),
    };

    let screens = match data.get("screens").and_then(Value::as_array) {
        Some(list) if !list.is_empty() => list,
        _ => return Err(ValidationError::EmptyCandidateList),
    };

    let candidates = screens
        .iter()
        .map(|screen| ScreenCandidate {
            // Opaque id, echoed back unchanged. Null when absent, matching
            // the lenient text handling below.
            id: screen.get("id").cloned().unwrap_or(Value::Null),
            text: screen
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect();

    Ok((advertiser_text, candidates))
}
