pub mod inventory;
pub mod orders;
pub mod verifications;

pub use inventory::InventoryService;
pub use orders::OrderService;
pub use verifications::StockVerificationService;
