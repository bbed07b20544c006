use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One ledger line: the quantity of a product held by one party at one store.
///
/// `rider_id = NULL` means the store itself holds the stock. The invariant
/// `remaining_quantity = stock_quantity - allocated_quantity` must hold after
/// every committed mutation; callers go through the inventory service rather
/// than deriving `remaining_quantity` themselves.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_id: i64,
    pub store_id: i64,
    /// Holder of the stock; NULL = the store itself
    pub rider_id: Option<i64>,
    /// Total units ever allocated to this holder on this line
    pub stock_quantity: i32,
    /// Units earmarked/reserved, not yet consumed
    pub allocated_quantity: i32,
    /// Units available to move or sell
    pub remaining_quantity: i32,
    /// Operational day this line belongs to
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_store_line(&self) -> bool {
        self.rider_id.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
