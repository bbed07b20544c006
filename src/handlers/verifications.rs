use crate::{
    dto::{ManifestItem, StockManifest},
    entities::stock_verification::{self, VerificationStatus, VerificationType},
    errors::ServiceError,
    services::verifications::{ResolveOutcome, SubmitVerification, VerificationFilter},
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
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitVerificationRequest {
    pub store_id: i64,
    pub rider_id: i64,
    pub verification_type: VerificationType,
    pub items: Vec<ManifestItem>,
    pub photo_urls: Option<Vec<String>>,
    pub cash_deposit_photo: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveVerificationRequest {
    pub outcome: ResolveOutcome,
    /// Staff member or administrator resolving the record
    pub verified_by: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct VerificationFilters {
    pub store_id: Option<i64>,
    pub rider_id: Option<i64>,
    pub status: Option<VerificationStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerificationResponse {
    pub id: i64,
    pub store_id: i64,
    pub rider_id: i64,
    pub verification_type: VerificationType,
    pub status: VerificationStatus,
    pub manifest: serde_json::Value,
    pub photo_urls: Option<serde_json::Value>,
    pub cash_deposit_photo: Option<String>,
    pub verified_by: Option<i64>,
    pub notes: Option<String>,
    pub ledger_applied: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<stock_verification::Model> for VerificationResponse {
    fn from(m: stock_verification::Model) -> Self {
        Self {
            id: m.id,
            store_id: m.store_id,
            rider_id: m.rider_id,
            verification_type: m.verification_type,
            status: m.status,
            manifest: m.manifest,
            photo_urls: m.photo_urls,
            cash_deposit_photo: m.cash_deposit_photo,
            verified_by: m.verified_by,
            notes: m.notes,
            ledger_applied: m.ledger_applied,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn verification_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_verification).get(list_verifications))
        .route("/:id", get(get_verification))
        .route("/:id/resolve", post(resolve_verification))
}

/// File a rider-submitted stock verification
#[utoipa::path(
    post,
    path = "/api/v1/stock-verifications",
    request_body = SubmitVerificationRequest,
    responses(
        (status = 201, description = "Verification filed", body = VerificationResponse),
        (status = 400, description = "Invalid manifest or rider", body = crate::errors::ErrorResponse),
        (status = 404, description = "Store or rider not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-verifications"
)]
pub async fn submit_verification(
    State(state): State<AppState>,
    Json(request): Json<SubmitVerificationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let manifest = StockManifest::new(request.items)?;
    let created = state
        .services
        .verifications
        .submit(SubmitVerification {
            store_id: request.store_id,
            rider_id: request.rider_id,
            verification_type: request.verification_type,
            manifest,
            photo_urls: request.photo_urls,
            cash_deposit_photo: request.cash_deposit_photo,
            notes: request.notes,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(VerificationResponse::from(created))),
    ))
}

/// List verifications, optionally filtered by store, rider, or status
#[utoipa::path(
    get,
    path = "/api/v1/stock-verifications",
    params(VerificationFilters),
    responses(
        (status = 200, description = "Verifications returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-verifications"
)]
pub async fn list_verifications(
    State(state): State<AppState>,
    Query(filters): Query<VerificationFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state
        .services
        .verifications
        .list(VerificationFilter {
            store_id: filters.store_id,
            rider_id: filters.rider_id,
            status: filters.status,
        })
        .await?;
    let found: Vec<VerificationResponse> =
        found.into_iter().map(VerificationResponse::from).collect();
    Ok(Json(ApiResponse::success(found)))
}

/// Fetch one verification by id
#[utoipa::path(
    get,
    path = "/api/v1/stock-verifications/{id}",
    params(("id" = i64, Path, description = "Verification id")),
    responses(
        (status = 200, description = "Verification returned", body = VerificationResponse),
        (status = 404, description = "Verification not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-verifications"
)]
pub async fn get_verification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.verifications.get(id).await?;
    Ok(Json(ApiResponse::success(VerificationResponse::from(
        found,
    ))))
}

/// Resolve a pending verification to confirmed or disputed
#[utoipa::path(
    post,
    path = "/api/v1/stock-verifications/{id}/resolve",
    params(("id" = i64, Path, description = "Verification id")),
    request_body = ResolveVerificationRequest,
    responses(
        (status = 200, description = "Verification resolved", body = VerificationResponse),
        (status = 403, description = "Resolver may not verify stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Verification not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Verification already processed", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-verifications"
)]
pub async fn resolve_verification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ResolveVerificationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let resolved = state
        .services
        .verifications
        .resolve(id, request.outcome, request.verified_by, request.notes)
        .await?;
    Ok(Json(ApiResponse::success(VerificationResponse::from(
        resolved,
    ))))
}
