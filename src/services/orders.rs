use crate::{
    db::DbPool,
    entities::{
        order::{self, Entity as Order, OrderStatus},
        product::{self, Entity as Product},
        store::{Entity as Store, StoreStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

/// One requested line of an order, before pricing.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub quantity: i32,
}

/// A line item after the guard has priced it from the current catalog.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PricedLineItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Result of running the order guard: every line priced from the catalog and
/// the recomputed total. Client-supplied prices are never trusted.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PricedOrder {
    pub store_id: i64,
    pub line_items: Vec<PricedLineItem>,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub store_id: i64,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub items: Vec<OrderItemInput>,
}

#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Runs the full admission guard for an order without persisting
    /// anything: the store must be open, every product must exist in that
    /// store's catalog and be available, and every line item must be well
    /// formed. Prices and the total come from the catalog, not the caller.
    #[instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn validate_and_price(
        &self,
        store_id: i64,
        items: &[OrderItemInput],
    ) -> Result<PricedOrder, ServiceError> {
        let db = self.db_pool.as_ref();

        let store = Store::find_by_id(store_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::StoreNotFound(store_id))?;

        // The store gate comes first: a closed store rejects every order,
        // whatever its items contain.
        if store.status != StoreStatus::Open {
            return Err(ServiceError::StoreClosed(store_id));
        }

        if items.is_empty() {
            return Err(ServiceError::EmptyOrder);
        }
        for item in items {
            if item.product_id <= 0 {
                return Err(ServiceError::InvalidLineItem(format!(
                    "product_id must be positive, got {}",
                    item.product_id
                )));
            }
            if item.quantity <= 0 {
                return Err(ServiceError::InvalidLineItem(format!(
                    "quantity for product {} must be positive, got {}",
                    item.product_id, item.quantity
                )));
            }
        }

        let requested_ids: BTreeSet<i64> = items.iter().map(|i| i.product_id).collect();
        let products = Product::find()
            .filter(product::Column::StoreId.eq(store_id))
            .filter(product::Column::Id.is_in(requested_ids.iter().copied()))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let by_id: HashMap<i64, &product::Model> =
            products.iter().map(|p| (p.id, p)).collect();

        let missing: Vec<i64> = requested_ids
            .iter()
            .copied()
            .filter(|id| !by_id.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(ServiceError::ProductNotFound(missing));
        }

        let unavailable: Vec<String> = products
            .iter()
            .filter(|p| !p.is_available)
            .map(|p| p.name.clone())
            .collect();
        if !unavailable.is_empty() {
            return Err(ServiceError::ProductUnavailable(unavailable));
        }

        let mut total = Decimal::ZERO;
        let mut line_items = Vec::with_capacity(items.len());
        for item in items {
            let product = by_id[&item.product_id];
            let line_total = product.price * Decimal::from(item.quantity);
            total += line_total;
            line_items.push(PricedLineItem {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: item.quantity,
                unit_price: product.price,
                line_total,
            });
        }

        Ok(PricedOrder {
            store_id,
            line_items,
            total_amount: total,
        })
    }

    /// Creates an order after the guard passes, freezing the priced line
    /// items and the recomputed total into the row.
    #[instrument(skip(self, input), fields(store_id = input.store_id))]
    pub async fn create_order(&self, input: CreateOrder) -> Result<order::Model, ServiceError> {
        let priced = self
            .validate_and_price(input.store_id, &input.items)
            .await?;

        let now = Utc::now();
        let order_items = serde_json::to_value(&priced.line_items)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        let created = order::ActiveModel {
            store_id: Set(input.store_id),
            rider_id: Set(None),
            customer_name: Set(input.customer_name),
            customer_phone: Set(input.customer_phone),
            total_amount: Set(priced.total_amount),
            status: Set(OrderStatus::New),
            order_items: Set(order_items),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db_pool.as_ref())
        .await
        .map_err(ServiceError::db_error)?;

        self.event_sender
            .send(Event::OrderCreated {
                order_id: created.id,
                store_id: created.store_id,
            })
            .await;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<order::Model, ServiceError> {
        Order::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, store_id: Option<i64>) -> Result<Vec<order::Model>, ServiceError> {
        let mut query = Order::find();
        if let Some(store_id) = store_id {
            query = query.filter(order::Column::StoreId.eq(store_id));
        }
        query
            .order_by(order::Column::CreatedAt, sea_orm::Order::Desc)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
