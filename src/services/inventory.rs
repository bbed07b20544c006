use crate::{
    db::DbPool,
    dto::{ManifestItem, StockManifest},
    entities::{
        inventory_record::{self, Entity as InventoryRecord},
        stock_verification::{self, VerificationStatus, VerificationType},
        store::Entity as Store,
        user::{self, Entity as User, UserRole},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::instrument;

/// How a manifest is folded into the rider's ledger lines.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ApplyMode {
    /// Add the claimed quantities on top of what the rider already holds
    /// (restock claims).
    Additive,
    /// Replace the rider's stock with the claimed quantities (start-of-day
    /// and end-of-day counts).
    Absolute,
}

/// Result of a restock transfer: the verification filed for the rider to
/// confirm, plus the rider's ledger lines after the move.
#[derive(Debug, Clone)]
pub struct RestockOutcome {
    pub verification: stock_verification::Model,
    pub rider_lines: Vec<inventory_record::Model>,
}

#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lists ledger lines, optionally narrowed to one store and/or one rider.
    #[instrument(skip(self))]
    pub async fn list_inventory(
        &self,
        store_id: Option<i64>,
        rider_id: Option<i64>,
    ) -> Result<Vec<inventory_record::Model>, ServiceError> {
        let mut query = InventoryRecord::find();
        if let Some(store_id) = store_id {
            query = query.filter(inventory_record::Column::StoreId.eq(store_id));
        }
        if let Some(rider_id) = rider_id {
            query = query.filter(inventory_record::Column::RiderId.eq(rider_id));
        }
        query
            .order_by(inventory_record::Column::Id, Order::Asc)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Moves stock from the store's own lines to a rider's lines and files a
    /// restock verification for the rider to confirm.
    ///
    /// The whole batch runs in one transaction: if any item lacks a store
    /// line or has insufficient remaining stock, nothing moves. The filed
    /// verification carries `ledger_applied = true` because the move is
    /// committed here; confirming it later only changes its status.
    #[instrument(skip(self, manifest), fields(items = manifest.len()))]
    pub async fn restock_rider(
        &self,
        store_id: i64,
        rider_id: i64,
        manifest: StockManifest,
        requested_by: i64,
    ) -> Result<RestockOutcome, ServiceError> {
        let db = self.db_pool.as_ref();
        let manifest_for_event = manifest.clone();

        let outcome = db
            .transaction::<_, RestockOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    require_staff_role(txn, requested_by).await?;
                    require_rider(txn, rider_id).await?;

                    Store::find_by_id(store_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or(ServiceError::StoreNotFound(store_id))?;

                    let now = Utc::now();
                    let mut rider_lines = Vec::with_capacity(manifest.len());

                    for item in manifest.items() {
                        let store_line = find_line(txn, store_id, item.product_id, None).await?;
                        let store_line = store_line.ok_or(ServiceError::NoStoreInventory {
                            product_id: item.product_id,
                            store_id,
                        })?;

                        if store_line.remaining_quantity < item.quantity {
                            return Err(ServiceError::InsufficientStock {
                                product_id: item.product_id,
                                available: store_line.remaining_quantity,
                                requested: item.quantity,
                            });
                        }

                        let remaining = store_line.remaining_quantity - item.quantity;
                        let mut store_active: inventory_record::ActiveModel = store_line.into();
                        store_active.remaining_quantity = Set(remaining);
                        store_active.updated_at = Set(now);
                        store_active
                            .update(txn)
                            .await
                            .map_err(ServiceError::db_error)?;

                        let rider_line =
                            add_to_rider_line(txn, store_id, rider_id, *item, ApplyMode::Additive)
                                .await?;
                        rider_lines.push(rider_line);
                    }

                    let verification = stock_verification::ActiveModel {
                        store_id: Set(store_id),
                        rider_id: Set(rider_id),
                        verification_type: Set(VerificationType::Restock),
                        status: Set(VerificationStatus::Pending),
                        manifest: Set(manifest.to_json()),
                        photo_urls: Set(None),
                        cash_deposit_photo: Set(None),
                        verified_by: Set(None),
                        notes: Set(Some(format!("Restock of {} products", manifest.len()))),
                        ledger_applied: Set(true),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    Ok(RestockOutcome {
                        verification,
                        rider_lines,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.event_sender
            .send(Event::RiderRestocked {
                store_id,
                rider_id,
                item_count: manifest_for_event.len(),
                total_units: manifest_for_event.total_units(),
            })
            .await;

        Ok(outcome)
    }
}

/// Fails unless `user_id` names an active administrator or store staff
/// member.
pub(crate) async fn require_staff_role<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
) -> Result<user::Model, ServiceError> {
    let user = User::find_by_id(user_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

    if !user.is_active {
        return Err(ServiceError::Forbidden(format!(
            "User {} is not active",
            user_id
        )));
    }
    if !user.role.can_verify_stock() {
        return Err(ServiceError::Forbidden(format!(
            "User {} may not manage stock",
            user_id
        )));
    }
    Ok(user)
}

/// Fails unless `rider_id` names a rider-seller.
pub(crate) async fn require_rider<C: ConnectionTrait>(
    conn: &C,
    rider_id: i64,
) -> Result<user::Model, ServiceError> {
    let rider = User::find_by_id(rider_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Rider {} not found", rider_id)))?;

    if rider.role != UserRole::RiderSeller {
        return Err(ServiceError::ValidationError(format!(
            "User {} is not a rider",
            rider_id
        )));
    }
    Ok(rider)
}

/// Finds one ledger line for (store, product, holder), oldest first.
/// `rider_id = None` selects the store's own line.
///
/// Callers read `remaining_quantity` and write a value derived from it, so
/// the row is fetched `FOR UPDATE`. Two concurrent transfers against the
/// same line then serialize instead of both reading the same balance.
/// SQLite's query builder drops the lock clause; its transactions lock the
/// whole database anyway.
async fn find_line<C: ConnectionTrait>(
    conn: &C,
    store_id: i64,
    product_id: i64,
    rider_id: Option<i64>,
) -> Result<Option<inventory_record::Model>, ServiceError> {
    let mut query = InventoryRecord::find()
        .filter(inventory_record::Column::StoreId.eq(store_id))
        .filter(inventory_record::Column::ProductId.eq(product_id));
    query = match rider_id {
        Some(rider_id) => query.filter(inventory_record::Column::RiderId.eq(rider_id)),
        None => query.filter(inventory_record::Column::RiderId.is_null()),
    };
    query
        .order_by(inventory_record::Column::CreatedAt, Order::Asc)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Folds one manifest item into the rider's ledger line for that product,
/// creating the line if the rider has never held the product.
///
/// Additive mode adds on top of the current stock; absolute mode replaces it.
/// Either way `remaining_quantity` is recomputed as stock minus allocated so
/// the line invariant holds after the write.
pub(crate) async fn add_to_rider_line<C: ConnectionTrait>(
    conn: &C,
    store_id: i64,
    rider_id: i64,
    item: ManifestItem,
    mode: ApplyMode,
) -> Result<inventory_record::Model, ServiceError> {
    let now = Utc::now();
    match find_line(conn, store_id, item.product_id, Some(rider_id)).await? {
        Some(existing) => {
            let new_stock = match mode {
                ApplyMode::Additive => existing
                    .stock_quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| {
                        ServiceError::ValidationError(format!(
                            "Stock for product {} would overflow",
                            item.product_id
                        ))
                    })?,
                ApplyMode::Absolute => item.quantity,
            };
            let remaining = new_stock - existing.allocated_quantity;
            // An absolute count below the line's allocation would drive
            // remaining negative; reject it and leave the line untouched.
            if remaining < 0 {
                return Err(ServiceError::InsufficientStock {
                    product_id: item.product_id,
                    available: new_stock,
                    requested: existing.allocated_quantity,
                });
            }
            let mut active: inventory_record::ActiveModel = existing.into();
            active.stock_quantity = Set(new_stock);
            active.remaining_quantity = Set(remaining);
            active.updated_at = Set(now);
            active.update(conn).await.map_err(ServiceError::db_error)
        }
        None => {
            inventory_record::ActiveModel {
                product_id: Set(item.product_id),
                store_id: Set(store_id),
                rider_id: Set(Some(rider_id)),
                stock_quantity: Set(item.quantity),
                allocated_quantity: Set(0),
                remaining_quantity: Set(item.quantity),
                date: Set(now.date_naive()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(conn)
            .await
            .map_err(ServiceError::db_error)
        }
    }
}

/// Applies every item of a manifest to the rider's lines. Used when a
/// confirmed verification commits its claims to the ledger.
pub(crate) async fn apply_manifest_to_rider<C: ConnectionTrait>(
    conn: &C,
    store_id: i64,
    rider_id: i64,
    manifest: &StockManifest,
    mode: ApplyMode,
) -> Result<Vec<inventory_record::Model>, ServiceError> {
    let mut lines = Vec::with_capacity(manifest.len());
    for item in manifest.items() {
        lines.push(add_to_rider_line(conn, store_id, rider_id, *item, mode).await?);
    }
    Ok(lines)
}
