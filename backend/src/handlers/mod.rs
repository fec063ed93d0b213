//! HTTP request handlers

mod catalog;
mod consumption;
mod health;
mod inventory;
mod stock_take;

pub use catalog::*;
pub use consumption::*;
pub use health::*;
pub use inventory::*;
pub use stock_take::*;
