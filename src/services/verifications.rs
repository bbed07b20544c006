use crate::{
    db::DbPool,
    dto::StockManifest,
    entities::{
        stock_verification::{self, Entity as StockVerification, VerificationStatus,
            VerificationType},
        store::Entity as Store,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory::{apply_manifest_to_rider, require_rider, require_staff_role, ApplyMode},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

/// Outcome chosen by the staff member resolving a pending verification.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolveOutcome {
    Confirmed,
    Disputed,
}

impl From<ResolveOutcome> for VerificationStatus {
    fn from(outcome: ResolveOutcome) -> Self {
        match outcome {
            ResolveOutcome::Confirmed => VerificationStatus::Confirmed,
            ResolveOutcome::Disputed => VerificationStatus::Disputed,
        }
    }
}

/// Input for filing a new rider-submitted verification.
#[derive(Debug, Clone)]
pub struct SubmitVerification {
    pub store_id: i64,
    pub rider_id: i64,
    pub verification_type: VerificationType,
    pub manifest: StockManifest,
    pub photo_urls: Option<Vec<String>>,
    pub cash_deposit_photo: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VerificationFilter {
    pub store_id: Option<i64>,
    pub rider_id: Option<i64>,
    pub status: Option<VerificationStatus>,
}

#[derive(Clone)]
pub struct StockVerificationService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl StockVerificationService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Files a rider-submitted verification in `pending` state. The claims
    /// in its manifest do not touch the ledger until a staff member confirms
    /// the record.
    #[instrument(skip(self, input), fields(store_id = input.store_id, rider_id = input.rider_id))]
    pub async fn submit(
        &self,
        input: SubmitVerification,
    ) -> Result<stock_verification::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        require_rider(db, input.rider_id).await?;
        Store::find_by_id(input.store_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or(ServiceError::StoreNotFound(input.store_id))?;

        let now = Utc::now();
        let photo_urls = input
            .photo_urls
            .map(|urls| serde_json::to_value(urls).unwrap_or_default());

        let verification = stock_verification::ActiveModel {
            store_id: Set(input.store_id),
            rider_id: Set(input.rider_id),
            verification_type: Set(input.verification_type.clone()),
            status: Set(VerificationStatus::Pending),
            manifest: Set(input.manifest.to_json()),
            photo_urls: Set(photo_urls),
            cash_deposit_photo: Set(input.cash_deposit_photo),
            verified_by: Set(None),
            notes: Set(input.notes),
            ledger_applied: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        self.event_sender
            .send(Event::VerificationSubmitted {
                verification_id: verification.id,
                store_id: verification.store_id,
                rider_id: verification.rider_id,
                verification_type: verification.verification_type.clone(),
            })
            .await;

        Ok(verification)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<stock_verification::Model, ServiceError> {
        StockVerification::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock verification {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: VerificationFilter,
    ) -> Result<Vec<stock_verification::Model>, ServiceError> {
        let mut query = StockVerification::find();
        if let Some(store_id) = filter.store_id {
            query = query.filter(stock_verification::Column::StoreId.eq(store_id));
        }
        if let Some(rider_id) = filter.rider_id {
            query = query.filter(stock_verification::Column::RiderId.eq(rider_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(stock_verification::Column::Status.eq(status));
        }
        query
            .order_by(stock_verification::Column::CreatedAt, Order::Desc)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Resolves a pending verification to `confirmed` or `disputed`.
    ///
    /// Resolution happens at most once; a second attempt fails with
    /// `AlreadyProcessed` no matter which outcome was recorded first.
    /// Confirming commits the manifest to the rider's ledger unless the
    /// movement was already committed when the record was filed (restock
    /// transfers), in which case only the status changes. Disputing never
    /// touches the ledger.
    #[instrument(skip(self, notes))]
    pub async fn resolve(
        &self,
        id: i64,
        outcome: ResolveOutcome,
        verified_by: i64,
        notes: Option<String>,
    ) -> Result<stock_verification::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let resolved = db
            .transaction::<_, stock_verification::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    // Locked so two concurrent confirms cannot both see the
                    // record as pending and commit its manifest twice.
                    let verification = StockVerification::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Stock verification {} not found", id))
                        })?;

                    if verification.status.is_resolved() {
                        return Err(ServiceError::AlreadyProcessed(id));
                    }

                    require_staff_role(txn, verified_by).await?;

                    let now = Utc::now();
                    let commit_to_ledger =
                        outcome == ResolveOutcome::Confirmed && !verification.ledger_applied;

                    if commit_to_ledger {
                        let manifest = StockManifest::from_json(&verification.manifest)?;
                        let mode = match verification.verification_type {
                            VerificationType::Restock => ApplyMode::Additive,
                            VerificationType::StartDay | VerificationType::EndDay => {
                                ApplyMode::Absolute
                            }
                        };
                        apply_manifest_to_rider(
                            txn,
                            verification.store_id,
                            verification.rider_id,
                            &manifest,
                            mode,
                        )
                        .await?;
                    }

                    let mut active: stock_verification::ActiveModel = verification.into();
                    active.status = Set(outcome.into());
                    active.verified_by = Set(Some(verified_by));
                    if notes.is_some() {
                        active.notes = Set(notes);
                    }
                    if commit_to_ledger {
                        active.ledger_applied = Set(true);
                    }
                    active.updated_at = Set(now);
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.event_sender
            .send(Event::VerificationResolved {
                verification_id: resolved.id,
                outcome: resolved.status.clone(),
                verified_by,
            })
            .await;

        Ok(resolved)
    }
}
