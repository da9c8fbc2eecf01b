//! HTTP-level tests for the gateway: routing, validation failures mapped
//! to the error body, and the ranking contract observed end to end
//! against the stub embedder.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::embedding::{EmbedderConfig, MODEL_NAME, MiniLmEmbedder};
use crate::gateway::{HandlerState, create_router_with_state};

fn test_router() -> Router {
    let embedder = MiniLmEmbedder::load(EmbedderConfig::stub()).expect("stub embedder");
    create_router_with_state(HandlerState::new(Arc::new(embedder)))
}

async fn post_recommend(router: Router, body: Body) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/recommend")
                .header(header::CONTENT_TYPE, "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

async fn post_recommend_json(router: Router, payload: Value) -> (StatusCode, Value) {
    post_recommend(router, Body::from(payload.to_string())).await
}

#[tokio::test]
async fn test_health_reports_model_and_stub_mode() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"], MODEL_NAME);
    assert_eq!(body["mode"], "stub");
}

#[tokio::test]
async fn test_valid_request_returns_full_result_set() {
    let payload = json!({
        "advertiser_text": "sports shoes",
        "screens": [
            {"id": 1, "text": "sports shoes ad"},
            {"id": 2, "text": "luxury watch"},
            {"id": 3, "text": "street food festival"}
        ]
    });

    let (status, body) = post_recommend_json(test_router(), payload).await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);

    let mut ids: Vec<i64> = results
        .iter()
        .map(|r| r["screenId"].as_i64().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);

    let scores: Vec<f64> = results
        .iter()
        .map(|r| r["score"].as_f64().unwrap())
        .collect();
    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1], "scores not descending: {scores:?}");
    }
}

#[tokio::test]
async fn test_exact_text_match_ranks_first() {
    // The stub embedder is deterministic per text, so the screen whose
    // text equals the query scores ~1.0 and must lead.
    let payload = json!({
        "advertiser_text": "sports shoes",
        "screens": [
            {"id": 2, "text": "luxury watch"},
            {"id": 1, "text": "sports shoes"}
        ]
    });

    let (status, body) = post_recommend_json(test_router(), payload).await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["screenId"], json!(1));
    assert!(results[0]["score"].as_f64().unwrap() > 0.999);
}

#[tokio::test]
async fn test_empty_body_is_rejected_as_missing_payload() {
    let (status, body) = post_recommend(test_router(), Body::empty()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No JSON data provided");
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_malformed_json_is_rejected_as_missing_payload() {
    let (status, body) =
        post_recommend(test_router(), Body::from("{not valid json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No JSON data provided");
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_empty_object_is_rejected_as_missing_payload() {
    let (status, body) = post_recommend_json(test_router(), json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No JSON data provided");
}

#[tokio::test]
async fn test_empty_advertiser_text_is_rejected() {
    let payload = json!({
        "advertiser_text": "",
        "screens": [{"id": 1, "text": "x"}]
    });

    let (status, body) = post_recommend_json(test_router(), payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "advertiser_text is required");
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_empty_screens_list_is_rejected() {
    let payload = json!({"advertiser_text": "x", "screens": []});

    let (status, body) = post_recommend_json(test_router(), payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "screens list is required and cannot be empty");
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_missing_screen_text_is_lenient() {
    let payload = json!({
        "advertiser_text": "anything",
        "screens": [{"id": "no-text"}]
    });

    let (status, body) = post_recommend_json(test_router(), payload).await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["screenId"], json!("no-text"));
}

#[tokio::test]
async fn test_string_and_object_ids_echo_back_unchanged() {
    let payload = json!({
        "advertiser_text": "billboard campaign",
        "screens": [
            {"id": "uuid-7f3a", "text": "a"},
            {"id": {"venue": 12, "slot": 3}, "text": "b"}
        ]
    });

    let (status, body) = post_recommend_json(test_router(), payload).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&Value> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| &r["screenId"])
        .collect();

    assert!(ids.contains(&&json!("uuid-7f3a")));
    assert!(ids.contains(&&json!({"venue": 12, "slot": 3})));
}

#[tokio::test]
async fn test_identical_requests_give_identical_responses() {
    let payload = json!({
        "advertiser_text": "coffee near the station",
        "screens": [
            {"id": 1, "text": "espresso bar"},
            {"id": 2, "text": "train timetable screen"},
            {"id": 3, "text": "coffee near the station"}
        ]
    });

    let (_, first) = post_recommend_json(test_router(), payload.clone()).await;
    let (_, second) = post_recommend_json(test_router(), payload).await;

    assert_eq!(first, second);
}
