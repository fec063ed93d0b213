//! Stock movement kinds and the pure ledger arithmetic
//!
//! Every change to an item's available quantity is one signed movement.
//! The arithmetic here is separated from the database plumbing so the
//! invariants (non-negative stock, exact signed deltas) are testable on
//! their own.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Replenishment (delivery, purchase receipt)
    In,
    /// Generic manual withdrawal
    Out,
    /// Absolute correction to a reconciled quantity
    Adjustment,
    /// Stock moved between two catalog items (e.g. locations)
    Transfer,
    /// Consumed by a customer order
    Sale,
    /// Consumed while producing a composite product
    Production,
    /// Spoilage, breakage, expiry
    Waste,
}

/// Direction a movement kind applies to the available quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementDirection {
    /// Increases available and lifetime-total quantity
    Inbound,
    /// Decreases available quantity
    Outbound,
    /// Sets available quantity to a supplied target
    Absolute,
    /// Outbound on the source item, inbound on the destination
    Transfer,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::In => "in",
            MovementKind::Out => "out",
            MovementKind::Adjustment => "adjustment",
            MovementKind::Transfer => "transfer",
            MovementKind::Sale => "sale",
            MovementKind::Production => "production",
            MovementKind::Waste => "waste",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MovementKind::In),
            "out" => Some(MovementKind::Out),
            "adjustment" => Some(MovementKind::Adjustment),
            "transfer" => Some(MovementKind::Transfer),
            "sale" => Some(MovementKind::Sale),
            "production" => Some(MovementKind::Production),
            "waste" => Some(MovementKind::Waste),
            _ => None,
        }
    }

    pub fn direction(&self) -> MovementDirection {
        match self {
            MovementKind::In => MovementDirection::Inbound,
            MovementKind::Out | MovementKind::Sale | MovementKind::Production | MovementKind::Waste => {
                MovementDirection::Outbound
            }
            MovementKind::Adjustment => MovementDirection::Absolute,
            MovementKind::Transfer => MovementDirection::Transfer,
        }
    }
}

/// The effect a validated movement has on one item's available quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    /// Add `quantity` (also accrues the lifetime total)
    Replenish(Decimal),
    /// Remove `quantity`
    Deplete(Decimal),
    /// Set the available quantity to an absolute target
    SetTo(Decimal),
}

/// Violation detected while computing a quantity change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerViolation {
    #[error("movement quantity must be positive")]
    NonPositiveQuantity,

    #[error("adjustment target cannot be negative")]
    NegativeTarget,

    #[error("insufficient stock: available {available}, requested {requested}")]
    InsufficientStock {
        available: Decimal,
        requested: Decimal,
    },
}

/// Outcome of applying one effect to a current balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityChange {
    /// The item's available quantity after the movement
    pub new_available: Decimal,
    /// Signed delta recorded on the movement row
    pub delta: Decimal,
    /// Whether the lifetime total quantity accrues by the magnitude
    pub accrues_total: bool,
}

/// Compute the quantity change for one item under one effect.
///
/// `allow_negative` is the explicit caller override for driving a balance
/// below zero (depleting kinds) or setting a negative target is never
/// allowed regardless of the flag.
pub fn next_quantity(
    current: Decimal,
    effect: StockEffect,
    allow_negative: bool,
) -> Result<QuantityChange, LedgerViolation> {
    match effect {
        StockEffect::Replenish(quantity) => {
            if quantity <= Decimal::ZERO {
                return Err(LedgerViolation::NonPositiveQuantity);
            }
            Ok(QuantityChange {
                new_available: current + quantity,
                delta: quantity,
                accrues_total: true,
            })
        }
        StockEffect::Deplete(quantity) => {
            if quantity <= Decimal::ZERO {
                return Err(LedgerViolation::NonPositiveQuantity);
            }
            if current < quantity && !allow_negative {
                return Err(LedgerViolation::InsufficientStock {
                    available: current,
                    requested: quantity,
                });
            }
            Ok(QuantityChange {
                new_available: current - quantity,
                delta: -quantity,
                accrues_total: false,
            })
        }
        StockEffect::SetTo(target) => {
            if target < Decimal::ZERO {
                return Err(LedgerViolation::NegativeTarget);
            }
            Ok(QuantityChange {
                new_available: target,
                delta: target - current,
                accrues_total: false,
            })
        }
    }
}
