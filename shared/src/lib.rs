//! Shared domain logic for the Dessert Shop Operations Platform
//!
//! This crate contains the pure parts of the inventory core: unit
//! conversion, movement arithmetic, recipe resolution, ingredient matching
//! and stock-take reconciliation math. Everything here is IO-free so the
//! backend and the test suites can exercise the same code paths.

pub mod matching;
pub mod movement;
pub mod recipes;
pub mod stocktake;
pub mod units;
pub mod validation;

pub use matching::*;
pub use movement::*;
pub use recipes::*;
pub use stocktake::*;
pub use units::*;
pub use validation::*;
