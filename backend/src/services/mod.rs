//! Business logic services

pub mod catalog;
pub mod consumption;
pub mod ledger;
pub mod recipe;
pub mod stock_take;

pub use catalog::CatalogService;
pub use consumption::ConsumptionService;
pub use ledger::LedgerService;
pub use recipe::RecipeService;
pub use stock_take::StockTakeService;
