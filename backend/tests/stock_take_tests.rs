//! Stock-take workflow tests
//!
//! Tests for the reconciliation lifecycle:
//! - Linear status transitions
//! - Variance arithmetic and report aggregation
//! - Adjustment typing from the variance sign, and why re-applying an
//!   absolute adjustment is naturally idempotent

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{
    next_quantity, summarize_variances, variance_quantity, variance_value, AdjustmentStatus,
    AdjustmentType, StockEffect, StockTakeStatus, VarianceLine,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn counted(name: &str, system: &str, physical: &str, unit_cost: &str) -> VarianceLine {
    let vq = variance_quantity(dec(physical), dec(system));
    VarianceLine {
        item_name: name.to_string(),
        system_quantity: dec(system),
        physical_quantity: Some(dec(physical)),
        variance_quantity: Some(vq),
        variance_value: Some(variance_value(vq, dec(unit_cost))),
    }
}

fn uncounted(name: &str, system: &str) -> VarianceLine {
    VarianceLine {
        item_name: name.to_string(),
        system_quantity: dec(system),
        physical_quantity: None,
        variance_quantity: None,
        variance_value: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// The lifecycle moves forward one step at a time, never backward
    #[test]
    fn test_status_machine() {
        assert!(StockTakeStatus::Draft.can_transition_to(StockTakeStatus::InProgress));
        assert!(StockTakeStatus::InProgress.can_transition_to(StockTakeStatus::Completed));

        assert!(!StockTakeStatus::Draft.can_transition_to(StockTakeStatus::Completed));
        assert!(!StockTakeStatus::InProgress.can_transition_to(StockTakeStatus::Draft));
        assert!(!StockTakeStatus::Completed.can_transition_to(StockTakeStatus::InProgress));
        assert!(!StockTakeStatus::Completed.can_transition_to(StockTakeStatus::Completed));
    }

    /// Completion closes the count gate. A count that lands after the
    /// totals were persisted would leave the summary describing lines that
    /// no longer exist, so it must be rejected, not silently stored.
    #[test]
    fn test_late_count_rejected_after_completion() {
        let lines = vec![counted("Sugar", "70", "65", "1.80"), uncounted("Milk", "20")];
        let at_completion = summarize_variances(&lines);
        assert_eq!(at_completion.items_counted, 1);
        assert_eq!(at_completion.total_variance_value, dec("-9.00"));

        assert!(StockTakeStatus::InProgress.accepts_counts());
        assert!(!StockTakeStatus::Completed.accepts_counts());
        assert!(!StockTakeStatus::Draft.accepts_counts());

        // A late Milk count would desynchronize the persisted totals
        let with_late_count = vec![
            counted("Sugar", "70", "65", "1.80"),
            counted("Milk", "20", "22", "1.50"),
        ];
        let after = summarize_variances(&with_late_count);
        assert_ne!(after.total_variance_value, at_completion.total_variance_value);
        assert_ne!(after.items_counted, at_completion.items_counted);
    }

    #[test]
    fn test_status_wire_strings() {
        for status in [
            StockTakeStatus::Draft,
            StockTakeStatus::InProgress,
            StockTakeStatus::Completed,
        ] {
            assert_eq!(StockTakeStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(StockTakeStatus::from_str("cancelled"), None);
    }

    /// System 70, counted 65, unit cost 1.80: variance -5 worth -9.00
    #[test]
    fn test_sugar_variance_arithmetic() {
        let vq = variance_quantity(dec("65"), dec("70"));
        assert_eq!(vq, dec("-5"));
        assert_eq!(variance_value(vq, dec("1.80")), dec("-9.00"));
        assert_eq!(AdjustmentType::from_variance(vq), Some(AdjustmentType::Decrease));
    }

    /// Zero variance produces no adjustment
    #[test]
    fn test_zero_variance_no_adjustment() {
        let vq = variance_quantity(dec("40"), dec("40"));
        assert_eq!(vq, Decimal::ZERO);
        assert_eq!(AdjustmentType::from_variance(vq), None);
    }

    /// Overage becomes an increase adjustment
    #[test]
    fn test_overage_is_increase() {
        let vq = variance_quantity(dec("52"), dec("50"));
        assert_eq!(AdjustmentType::from_variance(vq), Some(AdjustmentType::Increase));
    }

    /// Report aggregation: counted vs uncounted, signed partitions, and the
    /// zero-variance line contributing to the total but not the count
    #[test]
    fn test_variance_summary() {
        let lines = vec![
            counted("Sugar", "70", "65", "1.80"),
            counted("Milk", "20", "22", "1.50"),
            counted("Cones", "100", "100", "0.25"),
            uncounted("Napkins", "500"),
        ];

        let summary = summarize_variances(&lines);
        assert_eq!(summary.total_items, 4);
        assert_eq!(summary.items_counted, 3);
        assert_eq!(summary.items_with_variance, 2);
        assert_eq!(summary.positive_variances, 1);
        assert_eq!(summary.negative_variances, 1);
        // -9.00 + 3.00 + 0 = -6.00
        assert_eq!(summary.total_variance_value, dec("-6.00"));
    }

    /// Applying an absolute adjustment twice lands on the same balance:
    /// the second application is a zero-delta no-op
    #[test]
    fn test_absolute_adjustment_is_idempotent() {
        let first = next_quantity(dec("70"), StockEffect::SetTo(dec("65")), false).unwrap();
        assert_eq!(first.new_available, dec("65"));
        assert_eq!(first.delta, dec("-5"));

        let second = next_quantity(first.new_available, StockEffect::SetTo(dec("65")), false)
            .unwrap();
        assert_eq!(second.new_available, dec("65"));
        assert_eq!(second.delta, Decimal::ZERO);
    }

    #[test]
    fn test_adjustment_status_wire_strings() {
        assert_eq!(AdjustmentStatus::Pending.as_str(), "pending");
        assert_eq!(AdjustmentStatus::from_str("approved"), Some(AdjustmentStatus::Approved));
        assert_eq!(AdjustmentStatus::from_str("rejected"), None);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// variance = physical - system, and its sign determines the type
        #[test]
        fn prop_variance_sign_determines_type(physical in quantity_strategy(), system in quantity_strategy()) {
            let vq = variance_quantity(physical, system);
            prop_assert_eq!(system + vq, physical);

            match AdjustmentType::from_variance(vq) {
                Some(AdjustmentType::Increase) => prop_assert!(physical > system),
                Some(AdjustmentType::Decrease) => prop_assert!(physical < system),
                None => prop_assert_eq!(physical, system),
            }
        }

        /// Variance value scales linearly with unit cost
        #[test]
        fn prop_variance_value_linear(vq in quantity_strategy(), cost in quantity_strategy()) {
            prop_assert_eq!(variance_value(vq, cost), vq * cost);
            prop_assert_eq!(variance_value(-vq, cost), -(vq * cost));
        }

        /// Summary totals are consistent with the lines they summarize
        #[test]
        fn prop_summary_consistency(counts in prop::collection::vec((quantity_strategy(), quantity_strategy()), 0..20)) {
            let lines: Vec<VarianceLine> = counts
                .iter()
                .map(|(system, physical)| {
                    let vq = variance_quantity(*physical, *system);
                    VarianceLine {
                        item_name: "Item".to_string(),
                        system_quantity: *system,
                        physical_quantity: Some(*physical),
                        variance_quantity: Some(vq),
                        variance_value: Some(variance_value(vq, dec("2"))),
                    }
                })
                .collect();

            let summary = summarize_variances(&lines);
            prop_assert_eq!(summary.total_items, lines.len());
            prop_assert_eq!(summary.items_counted, lines.len());
            prop_assert_eq!(
                summary.items_with_variance,
                summary.positive_variances + summary.negative_variances
            );

            let expected_total: Decimal = lines
                .iter()
                .filter_map(|l| l.variance_value)
                .sum();
            prop_assert_eq!(summary.total_variance_value, expected_total);
        }

        /// Applying a generated adjustment to the system quantity always
        /// reproduces the physical count
        #[test]
        fn prop_adjustment_reconciles_to_physical(system in quantity_strategy(), physical in quantity_strategy()) {
            let change = next_quantity(system, StockEffect::SetTo(physical), false).unwrap();
            prop_assert_eq!(change.new_available, physical);
            prop_assert_eq!(change.delta, variance_quantity(physical, system));
        }
    }
}
