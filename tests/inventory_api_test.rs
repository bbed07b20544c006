mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal_macros::dec;
use serde_json::json;
use vendhub_api::entities::{store::StoreStatus, user::UserRole};

#[tokio::test]
async fn restock_endpoint_moves_stock_and_returns_rider_lines() {
    let app = TestApp::new().await;
    let staff = app.seed_user("staff@test.dev", UserRole::StoreStaff).await;
    let rider = app.seed_user("rider@test.dev", UserRole::RiderSeller).await;
    let store = app.seed_store(staff.id, StoreStatus::Open).await;
    let product = app.seed_product(store.id, "Cola", dec!(2.50), true).await;
    app.seed_inventory_line(store.id, product.id, None, 100, 0)
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/restock",
            Some(json!({
                "store_id": store.id,
                "rider_id": rider.id,
                "requested_by": staff.id,
                "items": [{ "product_id": product.id, "quantity": 30 }],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = TestApp::response_json(response).await;
    assert_eq!(body["data"]["rider_lines"][0]["remaining_quantity"], json!(30));
    assert!(body["data"]["verification_id"].as_i64().unwrap() > 0);

    // Filtered listing shows the rider's line only
    let response = app
        .request(
            Method::GET,
            &format!(
                "/api/v1/inventory?store_id={}&rider_id={}",
                store.id, rider.id
            ),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::response_json(response).await;
    let lines = body["data"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["rider_id"], json!(rider.id));

    // Unfiltered listing shows both the store line and the rider line
    let response = app.request(Method::GET, "/api/v1/inventory", None).await;
    let body = TestApp::response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn restock_endpoint_rejects_invalid_manifests() {
    let app = TestApp::new().await;
    let staff = app.seed_user("staff@test.dev", UserRole::StoreStaff).await;
    let rider = app.seed_user("rider@test.dev", UserRole::RiderSeller).await;
    let store = app.seed_store(staff.id, StoreStatus::Open).await;

    for bad_items in [
        json!([]),
        json!([{ "product_id": 1, "quantity": 0 }]),
        json!([{ "product_id": 1, "quantity": 5 }, { "product_id": 1, "quantity": 3 }]),
    ] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/inventory/restock",
                Some(json!({
                    "store_id": store.id,
                    "rider_id": rider.id,
                    "requested_by": staff.id,
                    "items": bad_items,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn verification_endpoints_cover_the_full_workflow() {
    let app = TestApp::new().await;
    let staff = app.seed_user("staff@test.dev", UserRole::Administrator).await;
    let rider = app.seed_user("rider@test.dev", UserRole::RiderSeller).await;
    let store = app.seed_store(staff.id, StoreStatus::Open).await;
    let product = app.seed_product(store.id, "Cola", dec!(2.50), true).await;

    // Rider files an end-of-day count
    let response = app
        .request(
            Method::POST,
            "/api/v1/stock-verifications",
            Some(json!({
                "store_id": store.id,
                "rider_id": rider.id,
                "verification_type": "end_day",
                "items": [{ "product_id": product.id, "quantity": 55 }],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = TestApp::response_json(response).await;
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["status"], json!("pending"));

    // Staff confirms it
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/stock-verifications/{}/resolve", id),
            Some(json!({ "outcome": "confirmed", "verified_by": staff.id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::response_json(response).await;
    assert_eq!(body["data"]["status"], json!("confirmed"));
    assert_eq!(body["data"]["verified_by"], json!(staff.id));

    // A second resolution is a conflict
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/stock-verifications/{}/resolve", id),
            Some(json!({ "outcome": "disputed", "verified_by": staff.id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The confirmed count landed on the rider's line
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/inventory?rider_id={}", rider.id),
            None,
        )
        .await;
    let body = TestApp::response_json(response).await;
    assert_eq!(body["data"][0]["stock_quantity"], json!(55));

    // Status filter and direct fetch
    let response = app
        .request(
            Method::GET,
            "/api/v1/stock-verifications?status=confirmed",
            None,
        )
        .await;
    let body = TestApp::response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .request(Method::GET, "/api/v1/stock-verifications/424242", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoint_reports_a_healthy_database() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::response_json(response).await;
    assert_eq!(body["data"]["status"], json!("healthy"));
    assert_eq!(body["data"]["checks"]["database"], json!("healthy"));
}
