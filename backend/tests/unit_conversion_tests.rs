//! Unit conversion tests
//!
//! Tests for quantity conversion between recipe units and catalog units:
//! - Same-family conversions are exact and reversible
//! - Cross-family conversions pass the quantity through with a warning
//! - Count units normalize across spellings

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{convert, ConversionOutcome, Unit, UnitFamily};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// 1500 g into a kg-stocked item
    #[test]
    fn test_grams_to_kilograms() {
        let result = convert(dec("1500"), "g", "kg");
        assert_eq!(result.quantity, dec("1.5"));
        assert_eq!(result.outcome, ConversionOutcome::Converted);
    }

    /// Count units are the same unit under different spellings
    #[test]
    fn test_count_spellings_are_identity() {
        let result = convert(dec("3"), "pcs", "pieces");
        assert_eq!(result.quantity, dec("3"));
        assert_eq!(result.outcome, ConversionOutcome::Identity);
    }

    /// Mass into volume has no conversion path
    #[test]
    fn test_cross_family_passes_through_with_warning() {
        let result = convert(dec("5"), "kg", "L");
        assert_eq!(result.quantity, dec("5"));
        assert_eq!(result.outcome, ConversionOutcome::Unavailable);
        assert!(result.is_unavailable());
    }

    #[test]
    fn test_milliliters_to_liters() {
        let result = convert(dec("250"), "ml", "L");
        assert_eq!(result.quantity, dec("0.25"));
        assert_eq!(result.outcome, ConversionOutcome::Converted);
    }

    #[test]
    fn test_liters_to_milliliters() {
        let result = convert(dec("1.5"), "L", "ml");
        assert_eq!(result.quantity, dec("1500"));
        assert_eq!(result.outcome, ConversionOutcome::Converted);
    }

    /// Equal spellings short-circuit before any unit parsing
    #[test]
    fn test_equal_strings_are_identity_even_when_unknown() {
        let result = convert(dec("2"), "scoop", "scoop");
        assert_eq!(result.quantity, dec("2"));
        assert_eq!(result.outcome, ConversionOutcome::Identity);
    }

    /// Unknown units have no path; quantity survives unchanged
    #[test]
    fn test_unknown_unit_passes_through() {
        let result = convert(dec("2"), "scoop", "kg");
        assert_eq!(result.quantity, dec("2"));
        assert!(result.is_unavailable());
    }

    #[test]
    fn test_unit_parsing_is_case_insensitive() {
        assert_eq!(Unit::parse("KG"), Some(Unit::Kilogram));
        assert_eq!(Unit::parse("Litre"), Some(Unit::Liter));
        assert_eq!(Unit::parse("Pieces"), Some(Unit::Piece));
        assert_eq!(Unit::parse("grams"), Some(Unit::Gram));
        assert_eq!(Unit::parse("furlong"), None);
    }

    #[test]
    fn test_unit_families() {
        assert_eq!(Unit::Gram.family(), UnitFamily::Mass);
        assert_eq!(Unit::Kilogram.family(), UnitFamily::Mass);
        assert_eq!(Unit::Milliliter.family(), UnitFamily::Volume);
        assert_eq!(Unit::Liter.family(), UnitFamily::Volume);
        assert_eq!(Unit::Piece.family(), UnitFamily::Count);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn unit_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("g"),
            Just("kg"),
            Just("ml"),
            Just("L"),
            Just("pcs"),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Converting there and back returns the original quantity
        #[test]
        fn prop_same_family_round_trip(qty in quantity_strategy()) {
            let there = convert(qty, "g", "kg");
            let back = convert(there.quantity, "kg", "g");
            prop_assert_eq!(back.quantity, qty);
        }

        /// A conversion never loses or invents quantity across families:
        /// unavailable paths pass the input through untouched
        #[test]
        fn prop_unavailable_preserves_quantity(qty in quantity_strategy()) {
            let result = convert(qty, "kg", "ml");
            prop_assert_eq!(result.outcome, ConversionOutcome::Unavailable);
            prop_assert_eq!(result.quantity, qty);
        }

        /// Converting a unit to itself is always identity
        #[test]
        fn prop_self_conversion_is_identity(qty in quantity_strategy(), unit in unit_strategy()) {
            let result = convert(qty, unit, unit);
            prop_assert_eq!(result.outcome, ConversionOutcome::Identity);
            prop_assert_eq!(result.quantity, qty);
        }

        /// Same-family conversion scales by exactly the factor ratio
        #[test]
        fn prop_mass_conversion_factor(qty in quantity_strategy()) {
            let result = convert(qty, "kg", "g");
            prop_assert_eq!(result.outcome, ConversionOutcome::Converted);
            prop_assert_eq!(result.quantity, qty * dec("1000"));
        }
    }
}
