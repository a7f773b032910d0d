use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use uuid::Uuid;

use stylematch_api::{
    routes::{create_router, AppState},
    services::{
        catalog::FixtureCatalog,
        vision::FixtureVision,
        InteractionLedger, QuotaGate, RecommendationEngine, SearchOrchestrator,
    },
    store::MemoryStore,
};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

fn create_test_server(daily_limit: u32) -> TestServer {
    let store = Arc::new(MemoryStore::new());
    let catalog = Arc::new(FixtureCatalog);
    let quota = Arc::new(QuotaGate::new(daily_limit, store.clone()));
    let recommendations = Arc::new(RecommendationEngine::new(store.clone(), catalog.clone(), 20));
    let search = Arc::new(SearchOrchestrator::new(
        Arc::new(FixtureVision::default()),
        catalog,
        store.clone(),
        quota.clone(),
        recommendations.clone(),
    ));
    let ledger = Arc::new(InteractionLedger::new(store));

    let app = create_router(AppState {
        search,
        ledger,
        recommendations,
        quota,
    });
    TestServer::new(app).unwrap()
}

fn png_base64() -> String {
    STANDARD.encode(PNG_MAGIC)
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(5);
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_image_search_returns_scored_products() {
    let server = create_test_server(5);
    let user_id = Uuid::new_v4();

    let response = server
        .post("/api/v1/search")
        .json(&json!({
            "user_id": user_id,
            "image_base64": png_base64(),
        }))
        .await;

    response.assert_status_ok();
    let record: serde_json::Value = response.json();
    assert_eq!(record["user_id"], json!(user_id));
    assert_eq!(record["description"]["item_type"], "sneakers");

    let products = record["products"].as_array().unwrap();
    assert!(!products.is_empty());
    assert!(products.len() <= 20);

    // Scores are in range and ordered descending
    let scores: Vec<u64> = products
        .iter()
        .map(|p| p["similarity_score"].as_u64().unwrap())
        .collect();
    assert!(scores.iter().all(|s| *s <= 100));
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));

    // The search shows up in history
    let response = server
        .get(&format!("/api/v1/search/history/{}", user_id))
        .await;
    response.assert_status_ok();
    let history: Vec<serde_json::Value> = response.json();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], record["id"]);
}

#[tokio::test]
async fn test_search_rejects_bad_images() {
    let server = create_test_server(5);
    let user_id = Uuid::new_v4();

    // Not base64 at all
    let response = server
        .post("/api/v1/search")
        .json(&json!({
            "user_id": user_id,
            "image_base64": "!!! not base64 !!!",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Valid base64, but not an image
    let response = server
        .post("/api/v1/search")
        .json(&json!({
            "user_id": user_id,
            "image_base64": STANDARD.encode(b"just some text"),
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quota_limit_and_premium_bypass() {
    let server = create_test_server(2);
    let user_id = Uuid::new_v4();

    for _ in 0..2 {
        let response = server
            .post("/api/v1/search")
            .json(&json!({
                "user_id": user_id,
                "image_base64": png_base64(),
            }))
            .await;
        response.assert_status_ok();
    }

    // Third search of the day is denied with the reset interval
    let response = server
        .post("/api/v1/search")
        .json(&json!({
            "user_id": user_id,
            "image_base64": png_base64(),
        }))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = response.json();
    assert!(body["reset_in_secs"].as_i64().unwrap() > 0);

    // Premium lifts the limit
    let response = server
        .post(&format!("/api/v1/users/{}/premium", user_id))
        .json(&json!({}))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server
        .post("/api/v1/search")
        .json(&json!({
            "user_id": user_id,
            "image_base64": png_base64(),
        }))
        .await;
    response.assert_status_ok();

    // Revoking premium restores the (already exhausted) daily limit
    let response = server
        .delete(&format!("/api/v1/users/{}/premium", user_id))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server
        .post("/api/v1/search")
        .json(&json!({
            "user_id": user_id,
            "image_base64": png_base64(),
        }))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_failed_search_does_not_consume_quota() {
    let server = create_test_server(1);
    let user_id = Uuid::new_v4();

    // A rejected image must not use up the single daily slot
    let response = server
        .post("/api/v1/search")
        .json(&json!({
            "user_id": user_id,
            "image_base64": STANDARD.encode(b"not an image"),
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/v1/search")
        .json(&json!({
            "user_id": user_id,
            "image_base64": png_base64(),
        }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_text_search_flow() {
    let server = create_test_server(5);
    let user_id = Uuid::new_v4();

    // Too short
    let response = server
        .post("/api/v1/search/text")
        .json(&json!({ "user_id": user_id, "query": "ab" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/v1/search/text")
        .json(&json!({ "user_id": user_id, "query": "blue denim jacket" }))
        .await;
    response.assert_status_ok();
    let record: serde_json::Value = response.json();
    assert_eq!(record["description"]["item_type"], "blue denim jacket");
    assert!(record["image_url"].is_null());
}

#[tokio::test]
async fn test_get_search_by_id() {
    let server = create_test_server(5);
    let user_id = Uuid::new_v4();

    let response = server
        .post("/api/v1/search/text")
        .json(&json!({ "user_id": user_id, "query": "black leather boots" }))
        .await;
    response.assert_status_ok();
    let record: serde_json::Value = response.json();
    let id = record["id"].as_str().unwrap();

    let response = server.get(&format!("/api/v1/search/{}", id)).await;
    response.assert_status_ok();
    let fetched: serde_json::Value = response.json();
    assert_eq!(fetched["id"], record["id"]);

    let response = server
        .get(&format!("/api/v1/search/{}", Uuid::new_v4()))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_record_interaction() {
    let server = create_test_server(5);
    let user_id = Uuid::new_v4();

    let response = server
        .post("/api/v1/interactions")
        .json(&json!({
            "user_id": user_id,
            "product_id": "fixture_3",
            "kind": "favorite",
            "category": "sneakers",
            "price": 59.0,
        }))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    // Unknown kinds are rejected
    let response = server
        .post("/api/v1/interactions")
        .json(&json!({
            "user_id": user_id,
            "product_id": "fixture_3",
            "kind": "purchased",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommendations_cold_start_and_refresh() {
    let server = create_test_server(5);
    let user_id = Uuid::new_v4();

    // A brand-new user still gets a feed
    let response = server
        .get(&format!("/api/v1/recommendations/{}", user_id))
        .await;
    response.assert_status_ok();
    let feed: serde_json::Value = response.json();
    let products = feed["products"].as_array().unwrap();
    assert!(!products.is_empty());
    assert!(products.len() <= 20);

    // Favorite a product from the feed, then refresh: it disappears
    let favorite_id = products[0]["id"].as_str().unwrap().to_string();
    let response = server
        .post("/api/v1/interactions")
        .json(&json!({
            "user_id": user_id,
            "product_id": favorite_id,
            "kind": "favorite",
        }))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server
        .post(&format!("/api/v1/recommendations/{}/refresh", user_id))
        .await;
    response.assert_status_ok();
    let refreshed: serde_json::Value = response.json();
    assert!(refreshed["products"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["id"] != json!(favorite_id)));
}
