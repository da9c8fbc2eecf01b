//! End-to-end tests against the public crate API: stub embedder, real
//! router, real validation and ranking pipeline.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use screenrank::{EmbedderConfig, HandlerState, MiniLmEmbedder, create_router_with_state};

fn build_app() -> Router {
    let embedder = MiniLmEmbedder::load(EmbedderConfig::stub()).expect("stub embedder");
    create_router_with_state(HandlerState::new(Arc::new(embedder)))
}

async fn recommend(app: Router, payload: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/recommend")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_spec_example_sports_shoes() {
    let payload = json!({
        "advertiser_text": "sports shoes",
        "screens": [
            {"id": 1, "text": "sports shoes"},
            {"id": 2, "text": "luxury watch"}
        ]
    });

    let (status, body) = recommend(build_app(), payload).await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["screenId"], json!(1));
    assert_eq!(results[1]["screenId"], json!(2));
    assert!(results[0]["score"].as_f64().unwrap() >= results[1]["score"].as_f64().unwrap());
}

#[tokio::test]
async fn test_large_screen_list_round_trips_every_id() {
    let screens: Vec<Value> = (0..200)
        .map(|i| json!({"id": i, "text": format!("screen number {i} in the mall")}))
        .collect();
    let payload = json!({"advertiser_text": "mall retail promotion", "screens": screens});

    let (status, body) = recommend(build_app(), payload).await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 200);

    let mut ids: Vec<i64> = results
        .iter()
        .map(|r| r["screenId"].as_i64().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..200).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_validation_order_and_status_codes() {
    // First failure wins, all three kinds come back as 400 with the
    // shared empty-results error shape.
    let cases = [
        (json!({}), "No JSON data provided"),
        (
            json!({"advertiser_text": "", "screens": [{"id": 1}]}),
            "advertiser_text is required",
        ),
        (
            json!({"advertiser_text": "x", "screens": []}),
            "screens list is required and cannot be empty",
        ),
    ];

    for (payload, expected_error) in cases {
        let (status, body) = recommend(build_app(), payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], expected_error);
        assert_eq!(body["results"], json!([]));
    }
}

#[tokio::test]
async fn test_concurrent_requests_share_the_embedder() {
    let app = build_app();

    let payloads: Vec<Value> = (0..8)
        .map(|i| {
            json!({
                "advertiser_text": format!("campaign {i}"),
                "screens": [
                    {"id": 1, "text": format!("campaign {i}")},
                    {"id": 2, "text": "unrelated content"}
                ]
            })
        })
        .collect();

    let handles: Vec<_> = payloads
        .into_iter()
        .map(|payload| {
            let app = app.clone();
            tokio::spawn(async move { recommend(app, payload).await })
        })
        .collect();

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        // The screen matching its own campaign text always wins.
        assert_eq!(body["results"][0]["screenId"], json!(1));
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = build_app()
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
    assert_eq!(body["model"], "all-MiniLM-L6-v2");
}
