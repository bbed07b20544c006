use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What the manifest in a verification claims about rider stock.
#[derive(
    Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum VerificationType {
    /// Absolute snapshot of what the rider carries at the start of the day
    #[sea_orm(string_value = "start_day")]
    StartDay,
    /// Absolute snapshot of what the rider returns with at the end of the day
    #[sea_orm(string_value = "end_day")]
    EndDay,
    /// Additive claim of stock handed over mid-day
    #[sea_orm(string_value = "restock")]
    Restock,
}

#[derive(
    Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "disputed")]
    Disputed,
}

impl VerificationStatus {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, VerificationStatus::Pending)
    }
}

/// A stock verification record: a manifest of (product, quantity) claims
/// awaiting staff confirmation.
///
/// `ledger_applied` records whether the ledger effect of this verification
/// has already been committed. Restock transfers filed by the hub commit the
/// stock movement at transfer time and file their verification with
/// `ledger_applied = true`; confirming such a record is a status change only.
/// Rider-submitted claims are filed with `ledger_applied = false` and hit the
/// ledger when confirmed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_verifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub store_id: i64,
    pub rider_id: i64,
    pub verification_type: VerificationType,
    pub status: VerificationStatus,
    /// JSON array of `{ "product_id": .., "quantity": .. }` objects
    pub manifest: Json,
    pub photo_urls: Option<Json>,
    pub cash_deposit_photo: Option<String>,
    /// Staff or admin who resolved the record; NULL while pending
    pub verified_by: Option<i64>,
    pub notes: Option<String>,
    pub ledger_applied: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
