mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use vendhub_api::{
    entities::{store::StoreStatus, user::UserRole},
    errors::ServiceError,
    services::orders::{CreateOrder, OrderItemInput},
};

fn items(list: &[(i64, i32)]) -> Vec<OrderItemInput> {
    list.iter()
        .map(|(product_id, quantity)| OrderItemInput {
            product_id: *product_id,
            quantity: *quantity,
        })
        .collect()
}

#[tokio::test]
async fn closed_store_rejects_every_order() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@test.dev", UserRole::StoreStaff).await;
    let store = app.seed_store(owner.id, StoreStatus::Closed).await;
    let product = app.seed_product(store.id, "Cola", dec!(2.50), true).await;

    let svc = app.state.services.orders.clone();

    // The store gate fires before item validation: even an empty order
    // reports the closed store
    let err = svc.validate_and_price(store.id, &[]).await.unwrap_err();
    assert_matches!(err, ServiceError::StoreClosed(id) if id == store.id);

    let err = svc
        .validate_and_price(store.id, &items(&[(product.id, 1)]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::StoreClosed(_));
}

#[tokio::test]
async fn guard_rejects_malformed_orders() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@test.dev", UserRole::StoreStaff).await;
    let store = app.seed_store(owner.id, StoreStatus::Open).await;
    let product = app.seed_product(store.id, "Cola", dec!(2.50), true).await;

    let svc = app.state.services.orders.clone();

    let err = svc.validate_and_price(store.id, &[]).await.unwrap_err();
    assert_matches!(err, ServiceError::EmptyOrder);

    let err = svc
        .validate_and_price(store.id, &items(&[(product.id, 0)]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidLineItem(_));

    let err = svc
        .validate_and_price(store.id, &items(&[(-1, 2)]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidLineItem(_));

    let err = svc.validate_and_price(9999, &items(&[(1, 1)])).await.unwrap_err();
    assert_matches!(err, ServiceError::StoreNotFound(9999));
}

#[tokio::test]
async fn guard_checks_catalog_membership_and_availability() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@test.dev", UserRole::StoreStaff).await;
    let store = app.seed_store(owner.id, StoreStatus::Open).await;
    let other_store = app.seed_store(owner.id, StoreStatus::Open).await;
    let cola = app.seed_product(store.id, "Cola", dec!(2.50), true).await;
    let foreign = app
        .seed_product(other_store.id, "Foreign", dec!(9.99), true)
        .await;
    let hidden = app
        .seed_product(store.id, "Hidden Snack", dec!(4.00), false)
        .await;

    let svc = app.state.services.orders.clone();

    // Product from another store's catalog counts as missing
    let err = svc
        .validate_and_price(store.id, &items(&[(cola.id, 1), (foreign.id, 1)]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ProductNotFound(ids) if ids == vec![foreign.id]);

    let err = svc
        .validate_and_price(store.id, &items(&[(cola.id, 1), (hidden.id, 1)]))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::ProductUnavailable(names) if names == vec!["Hidden Snack".to_string()]
    );
}

#[tokio::test]
async fn totals_are_recomputed_from_the_catalog() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@test.dev", UserRole::StoreStaff).await;
    let store = app.seed_store(owner.id, StoreStatus::Open).await;
    let cola = app.seed_product(store.id, "Cola", dec!(2.50), true).await;
    let chips = app.seed_product(store.id, "Chips", dec!(1.75), true).await;

    let priced = app
        .state
        .services
        .orders
        .validate_and_price(store.id, &items(&[(cola.id, 3), (chips.id, 2)]))
        .await
        .unwrap();

    assert_eq!(priced.total_amount, dec!(11.00));
    assert_eq!(priced.line_items.len(), 2);
    let cola_line = priced
        .line_items
        .iter()
        .find(|l| l.product_id == cola.id)
        .unwrap();
    assert_eq!(cola_line.unit_price, dec!(2.50));
    assert_eq!(cola_line.line_total, dec!(7.50));
}

#[tokio::test]
async fn created_order_freezes_priced_lines() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@test.dev", UserRole::StoreStaff).await;
    let store = app.seed_store(owner.id, StoreStatus::Open).await;
    let cola = app.seed_product(store.id, "Cola", dec!(2.50), true).await;

    let created = app
        .state
        .services
        .orders
        .create_order(CreateOrder {
            store_id: store.id,
            customer_name: Some("Ada".to_string()),
            customer_phone: None,
            items: items(&[(cola.id, 4)]),
        })
        .await
        .unwrap();

    assert_eq!(created.total_amount, dec!(10.00));
    let frozen: Vec<serde_json::Value> =
        serde_json::from_value(created.order_items.clone()).unwrap();
    assert_eq!(frozen.len(), 1);
    // SQLite keeps decimals in a REAL column, so the serialized scale is not
    // stable; compare the parsed value instead of the string literal.
    let unit_price: Decimal = frozen[0]["unit_price"].as_str().unwrap().parse().unwrap();
    assert_eq!(unit_price, dec!(2.50));

    let fetched = app.state.services.orders.get(created.id).await.unwrap();
    assert_eq!(fetched.total_amount, created.total_amount);
}

#[tokio::test]
async fn order_endpoints_map_guard_failures_to_status_codes() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@test.dev", UserRole::StoreStaff).await;
    let open = app.seed_store(owner.id, StoreStatus::Open).await;
    let closed = app.seed_store(owner.id, StoreStatus::Closed).await;
    let cola = app.seed_product(open.id, "Cola", dec!(2.50), true).await;

    // Closed store: 422 with the store named in the message
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/validate",
            Some(json!({
                "store_id": closed.id,
                "items": [{ "product_id": cola.id, "quantity": 1 }],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = TestApp::response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains(&closed.id.to_string()));

    // Empty order: 400
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/validate",
            Some(json!({ "store_id": open.id, "items": [] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Oversized customer name: 400 from payload validation
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "store_id": open.id,
                "customer_name": "x".repeat(300),
                "items": [{ "product_id": cola.id, "quantity": 1 }],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Valid order: 201 and an envelope with the recomputed total
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "store_id": open.id,
                "customer_name": "Ada",
                "items": [{ "product_id": cola.id, "quantity": 2 }],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = TestApp::response_json(response).await;
    assert_eq!(body["success"], json!(true));
    let total: Decimal = body["data"]["total_amount"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(total, dec!(5.00));
}
