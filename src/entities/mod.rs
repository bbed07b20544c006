pub mod inventory_record;
pub mod order;
pub mod product;
pub mod stock_verification;
pub mod store;
pub mod user;
