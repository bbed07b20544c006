use crate::{
    entities::order::{self, OrderStatus},
    errors::ServiceError,
    services::orders::{CreateOrder, OrderItemInput, PricedOrder},
    ApiResponse, AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateOrderRequest {
    pub store_id: i64,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub store_id: i64,
    #[validate(length(max = 255))]
    pub customer_name: Option<String>,
    #[validate(length(max = 32))]
    pub customer_phone: Option<String>,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderFilters {
    pub store_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub store_id: i64,
    pub rider_id: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub order_items: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<order::Model> for OrderResponse {
    fn from(m: order::Model) -> Self {
        Self {
            id: m.id,
            store_id: m.store_id,
            rider_id: m.rider_id,
            customer_name: m.customer_name,
            customer_phone: m.customer_phone,
            total_amount: m.total_amount,
            status: m.status,
            order_items: m.order_items,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/validate", post(validate_order))
        .route("/:id", get(get_order))
}

/// Run the admission guard without creating anything
#[utoipa::path(
    post,
    path = "/api/v1/orders/validate",
    request_body = ValidateOrderRequest,
    responses(
        (status = 200, description = "Order admissible; priced lines returned", body = PricedOrder),
        (status = 400, description = "Empty order or invalid line item", body = crate::errors::ErrorResponse),
        (status = 404, description = "Store or products not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Store closed or products unavailable", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn validate_order(
    State(state): State<AppState>,
    Json(request): Json<ValidateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let priced = state
        .services
        .orders
        .validate_and_price(request.store_id, &request.items)
        .await?;
    Ok(Json(ApiResponse::success(priced)))
}

/// Create an order after the admission guard passes
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Empty order or invalid line item", body = crate::errors::ErrorResponse),
        (status = 404, description = "Store or products not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Store closed or products unavailable", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    let created = state
        .services
        .orders
        .create_order(CreateOrder {
            store_id: request.store_id,
            customer_name: request.customer_name,
            customer_phone: request.customer_phone,
            items: request.items,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(OrderResponse::from(created))),
    ))
}

/// List orders, optionally narrowed to one store
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderFilters),
    responses(
        (status = 200, description = "Orders returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(filters): Query<OrderFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.orders.list(filters.store_id).await?;
    let orders: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(Json(ApiResponse::success(orders)))
}

/// Fetch one order by id
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order returned", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.orders.get(id).await?;
    Ok(Json(ApiResponse::success(OrderResponse::from(found))))
}
