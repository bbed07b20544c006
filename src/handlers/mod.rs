use std::sync::Arc;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{InventoryService, OrderService, StockVerificationService},
};

pub mod inventory;
pub mod orders;
pub mod verifications;

/// Shared bundle of domain services handed to the handlers via `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    pub verifications: Arc<StockVerificationService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            inventory: Arc::new(InventoryService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            verifications: Arc::new(StockVerificationService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            orders: Arc::new(OrderService::new(db_pool, event_sender)),
        }
    }
}
