use serde::Serialize;
use serde_json::Value;

/// One screen to be ranked.
///
/// The id is caller-supplied opaque JSON; it is echoed back unchanged and
/// never interpreted. Produced by request validation, consumed by
/// [`RankingEngine`](super::RankingEngine).
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenCandidate {
    pub id: Value,
    pub text: String,
}

impl ScreenCandidate {
    pub fn new(id: impl Into<Value>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// One scored screen in the response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedScreen {
    #[serde(rename = "screenId")]
    pub screen_id: Value,
    pub score: f32,
}
