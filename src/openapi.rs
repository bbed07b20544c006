use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "VendHub API",
        version = "0.1.0",
        description = r#"
# VendHub Operations API

Back office API for mobile-vendor operations: the store inventory ledger,
rider restock transfers, stock verification workflow, and order intake.

## Error Handling

Failing endpoints return a consistent error payload with an appropriate
HTTP status code:

```json
{
  "error": "Unprocessable Entity",
  "message": "Insufficient stock for product 42: available 40, requested 50",
  "request_id": "req-abc123xyz",
  "timestamp": "2026-08-29T10:30:00.000Z"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "inventory", description = "Inventory ledger and restock transfers"),
        (name = "stock-verifications", description = "Stock verification workflow"),
        (name = "orders", description = "Order intake and admission guard")
    ),
    paths(
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::restock_rider,
        crate::handlers::verifications::submit_verification,
        crate::handlers::verifications::list_verifications,
        crate::handlers::verifications::get_verification,
        crate::handlers::verifications::resolve_verification,
        crate::handlers::orders::validate_order,
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
    ),
    components(
        schemas(
            crate::dto::ManifestItem,
            crate::handlers::inventory::InventoryLine,
            crate::handlers::inventory::RestockRequest,
            crate::handlers::inventory::RestockResponse,
            crate::handlers::verifications::SubmitVerificationRequest,
            crate::handlers::verifications::ResolveVerificationRequest,
            crate::handlers::verifications::VerificationResponse,
            crate::handlers::orders::ValidateOrderRequest,
            crate::handlers::orders::CreateOrderRequest,
            crate::handlers::orders::OrderResponse,
            crate::services::orders::OrderItemInput,
            crate::services::orders::PricedLineItem,
            crate::services::orders::PricedOrder,
            crate::services::verifications::ResolveOutcome,
            crate::entities::stock_verification::VerificationType,
            crate::entities::stock_verification::VerificationStatus,
            crate::entities::order::OrderStatus,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
