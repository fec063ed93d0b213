//! Input validation helpers shared by the backend services

use rust_decimal::Decimal;

/// Validate a movement or count quantity is strictly positive
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a counted physical quantity (zero allowed, negatives not)
pub fn validate_physical_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Physical quantity cannot be negative");
    }
    Ok(())
}

/// Validate a monetary amount (cost or price)
pub fn validate_non_negative_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    Ok(())
}

/// Validate a required name field
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty");
    }
    if name.len() > 200 {
        return Err("Name is too long (max 200 characters)");
    }
    Ok(())
}

/// Validate min/max stock levels and the reorder point are coherent
pub fn validate_stock_levels(
    min_level: Decimal,
    max_level: Decimal,
    reorder_point: Decimal,
) -> Result<(), &'static str> {
    if min_level < Decimal::ZERO || max_level < Decimal::ZERO || reorder_point < Decimal::ZERO {
        return Err("Stock levels cannot be negative");
    }
    if max_level > Decimal::ZERO && min_level > max_level {
        return Err("Minimum stock level cannot exceed maximum");
    }
    Ok(())
}
