use crate::{
    dto::{ManifestItem, StockManifest},
    entities::inventory_record,
    errors::ServiceError,
    ApiResponse, AppState,
};
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct InventoryFilters {
    /// Narrow to lines held at this store
    pub store_id: Option<i64>,
    /// Narrow to lines held by this rider
    pub rider_id: Option<i64>,
}

/// One ledger line as exposed by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryLine {
    pub id: i64,
    pub product_id: i64,
    pub store_id: i64,
    pub rider_id: Option<i64>,
    pub stock_quantity: i32,
    pub allocated_quantity: i32,
    pub remaining_quantity: i32,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<inventory_record::Model> for InventoryLine {
    fn from(m: inventory_record::Model) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            store_id: m.store_id,
            rider_id: m.rider_id,
            stock_quantity: m.stock_quantity,
            allocated_quantity: m.allocated_quantity,
            remaining_quantity: m.remaining_quantity,
            date: m.date,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestockRequest {
    pub store_id: i64,
    pub rider_id: i64,
    /// Staff member or administrator performing the transfer
    pub requested_by: i64,
    pub items: Vec<ManifestItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestockResponse {
    /// Verification filed for the rider to confirm receipt
    pub verification_id: i64,
    pub rider_lines: Vec<InventoryLine>,
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory))
        .route("/restock", post(restock_rider))
}

/// List ledger lines, optionally filtered by store and/or rider
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryFilters),
    responses(
        (status = 200, description = "Inventory lines returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(filters): Query<InventoryFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let lines = state
        .services
        .inventory
        .list_inventory(filters.store_id, filters.rider_id)
        .await?;
    let lines: Vec<InventoryLine> = lines.into_iter().map(InventoryLine::from).collect();
    Ok(Json(ApiResponse::success(lines)))
}

/// Move stock from a store's own lines to a rider's lines
#[utoipa::path(
    post,
    path = "/api/v1/inventory/restock",
    request_body = RestockRequest,
    responses(
        (status = 201, description = "Stock transferred and verification filed", body = RestockResponse),
        (status = 400, description = "Invalid manifest", body = crate::errors::ErrorResponse),
        (status = 403, description = "Requester may not manage stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Store, rider, or store line missing", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient store stock", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn restock_rider(
    State(state): State<AppState>,
    Json(request): Json<RestockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let manifest = StockManifest::new(request.items)?;
    let outcome = state
        .services
        .inventory
        .restock_rider(
            request.store_id,
            request.rider_id,
            manifest,
            request.requested_by,
        )
        .await?;

    let response = RestockResponse {
        verification_id: outcome.verification.id,
        rider_lines: outcome
            .rider_lines
            .into_iter()
            .map(InventoryLine::from)
            .collect(),
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}
