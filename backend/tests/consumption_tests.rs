//! Consumption policy tests
//!
//! Tests for the sale-driven deduction policies over resolved recipes:
//! - Partial failure: exhausted lines are skipped, the rest still deduct
//! - All-or-nothing: one shortfall blocks every deduction
//! - Atomic products reduce to a single stock comparison

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::{
    check_availability, next_quantity, resolve_recipe, LedgerViolation, MatchCandidate,
    RecipeIngredient, StockEffect,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn item(name: &str, category: &str, unit: &str, available: &str) -> MatchCandidate {
    MatchCandidate {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category: category.to_string(),
        unit: unit.to_string(),
        available_quantity: dec(available),
        cost_per_unit: dec("3.0"),
    }
}

fn line(ingredient: &str, category: Option<&str>, quantity: &str, unit: &str) -> RecipeIngredient {
    RecipeIngredient {
        ingredient: ingredient.to_string(),
        category: category.map(String::from),
        quantity: dec(quantity),
        unit: unit.to_string(),
    }
}

fn milkshake() -> Vec<RecipeIngredient> {
    vec![
        line("Chocolate Gelato", Some("gelato"), "0.15", "kg"),
        line("Milk", Some("dairy"), "200", "ml"),
        line("Chocolate Syrup", Some("toppings"), "15", "ml"),
    ]
}

/// Deduct each resolved line independently against its own balance,
/// classifying the outcome per line
fn deduct_per_line(
    resolution: &shared::RecipeResolution,
) -> (Vec<(String, Decimal)>, Vec<String>) {
    let mut deducted = Vec::new();
    let mut missing = Vec::new();

    for l in &resolution.resolved {
        match next_quantity(l.available_quantity, StockEffect::Deplete(l.quantity), false) {
            Ok(change) => deducted.push((l.item_name.clone(), change.new_available)),
            Err(LedgerViolation::InsufficientStock { .. }) => missing.push(l.item_name.clone()),
            Err(_) => missing.push(l.item_name.clone()),
        }
    }
    for l in &resolution.unresolved {
        missing.push(l.ingredient.clone());
    }

    (deducted, missing)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// One exhausted ingredient does not block the others
    #[test]
    fn test_partial_failure_deducts_remaining_lines() {
        let catalog = vec![
            item("Chocolate Gelato", "gelato", "kg", "5"),
            item("Milk", "dairy", "ml", "50"), // short: needs 200
            item("Chocolate Syrup", "toppings", "ml", "900"),
        ];

        let resolution = resolve_recipe(&milkshake(), dec("1"), &catalog);
        assert!(resolution.fully_resolved());

        let (deducted, missing) = deduct_per_line(&resolution);
        assert_eq!(deducted.len(), 2);
        assert_eq!(missing, vec!["Milk".to_string()]);

        // The successful lines landed at their reduced balances
        assert_eq!(deducted[0], ("Chocolate Gelato".to_string(), dec("4.85")));
        assert_eq!(deducted[1], ("Chocolate Syrup".to_string(), dec("885")));
    }

    /// All-or-nothing semantics: the availability check is the gate, and a
    /// failed gate means zero deductions
    #[test]
    fn test_all_or_nothing_blocks_on_any_shortfall() {
        let catalog = vec![
            item("Chocolate Gelato", "gelato", "kg", "5"),
            item("Milk", "dairy", "ml", "50"),
            item("Chocolate Syrup", "toppings", "ml", "900"),
        ];

        let resolution = resolve_recipe(&milkshake(), dec("1"), &catalog);
        let report = check_availability(&resolution);

        assert!(!report.available);
        assert_eq!(report.reasons.len(), 1);
        assert!(report.reasons[0].contains("Milk"));
    }

    /// With sufficient stock everywhere, every line deducts
    #[test]
    fn test_full_consumption() {
        let catalog = vec![
            item("Chocolate Gelato", "gelato", "kg", "5"),
            item("Milk", "dairy", "ml", "2000"),
            item("Chocolate Syrup", "toppings", "ml", "900"),
        ];

        let resolution = resolve_recipe(&milkshake(), dec("2"), &catalog);
        let (deducted, missing) = deduct_per_line(&resolution);

        assert_eq!(deducted.len(), 3);
        assert!(missing.is_empty());
        assert_eq!(deducted[1], ("Milk".to_string(), dec("1600")));
    }

    /// An unresolved ingredient surfaces as missing alongside stock shortfalls
    #[test]
    fn test_unresolved_ingredient_counts_as_missing() {
        let catalog = vec![
            item("Chocolate Gelato", "gelato", "kg", "5"),
            item("Chocolate Syrup", "toppings", "ml", "900"),
        ];

        let resolution = resolve_recipe(&milkshake(), dec("1"), &catalog);
        let (deducted, missing) = deduct_per_line(&resolution);

        assert_eq!(deducted.len(), 2);
        assert_eq!(missing, vec!["Milk".to_string()]);
    }

    /// An atomic product is one direct stock comparison
    #[test]
    fn test_atomic_product_check() {
        let available = dec("12");
        assert!(next_quantity(available, StockEffect::Deplete(dec("12")), false).is_ok());
        assert!(next_quantity(available, StockEffect::Deplete(dec("12.5")), false).is_err());
    }

    /// An atomic shortfall classifies as a missing line, the same shape the
    /// composite path reports, rather than failing the whole request
    #[test]
    fn test_atomic_shortfall_classified_as_missing() {
        let mut deducted: Vec<Decimal> = Vec::new();
        let mut missing: Vec<String> = Vec::new();

        match next_quantity(dec("12"), StockEffect::Deplete(dec("12.5")), false) {
            Ok(change) => deducted.push(change.new_available),
            Err(LedgerViolation::InsufficientStock { available, requested }) => missing.push(
                format!("available {}, requested {}", available, requested),
            ),
            Err(other) => panic!("unexpected violation: {:?}", other),
        }

        assert!(deducted.is_empty());
        assert_eq!(missing, vec!["available 12, requested 12.5".to_string()]);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Per-line deduction partitions every line into deducted or missing
        #[test]
        fn prop_every_line_classified(milk_stock in 0i64..500i64) {
            let catalog = vec![
                item("Chocolate Gelato", "gelato", "kg", "5"),
                item("Milk", "dairy", "ml", &milk_stock.to_string()),
                item("Chocolate Syrup", "toppings", "ml", "900"),
            ];

            let resolution = resolve_recipe(&milkshake(), Decimal::ONE, &catalog);
            let (deducted, missing) = deduct_per_line(&resolution);

            prop_assert_eq!(deducted.len() + missing.len(), milkshake().len());
            // Milk needs 200 ml for one shake
            if milk_stock >= 200 {
                prop_assert!(missing.is_empty());
            } else {
                prop_assert_eq!(missing, vec!["Milk".to_string()]);
            }
        }

        /// The availability gate agrees with per-line deduction outcomes
        #[test]
        fn prop_gate_agrees_with_deduction(milk_stock in 0i64..500i64) {
            let catalog = vec![
                item("Chocolate Gelato", "gelato", "kg", "5"),
                item("Milk", "dairy", "ml", &milk_stock.to_string()),
                item("Chocolate Syrup", "toppings", "ml", "900"),
            ];

            let resolution = resolve_recipe(&milkshake(), Decimal::ONE, &catalog);
            let report = check_availability(&resolution);
            let (_, missing) = deduct_per_line(&resolution);

            prop_assert_eq!(report.available, missing.is_empty());
        }
    }
}
