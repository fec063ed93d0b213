//! Stock-take reconciliation: status machine and variance arithmetic
//!
//! A stock take snapshots system quantities, collects physical counts and
//! reconciles the difference through approvable adjustments. The lifecycle
//! is strictly linear: draft → in_progress → completed. Approval is an
//! annotation on a completed take, not a fourth status.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stock-take lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockTakeStatus {
    Draft,
    InProgress,
    Completed,
}

impl StockTakeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockTakeStatus::Draft => "draft",
            StockTakeStatus::InProgress => "in_progress",
            StockTakeStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(StockTakeStatus::Draft),
            "in_progress" => Some(StockTakeStatus::InProgress),
            "completed" => Some(StockTakeStatus::Completed),
            _ => None,
        }
    }

    /// The lifecycle only moves forward, one step at a time
    pub fn can_transition_to(&self, next: StockTakeStatus) -> bool {
        matches!(
            (self, next),
            (StockTakeStatus::Draft, StockTakeStatus::InProgress)
                | (StockTakeStatus::InProgress, StockTakeStatus::Completed)
        )
    }

    /// Physical counts may only be recorded on an in-progress take. A count
    /// landing after completion would be invisible to the persisted totals.
    pub fn accepts_counts(&self) -> bool {
        matches!(self, StockTakeStatus::InProgress)
    }
}

/// Adjustment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentStatus {
    Pending,
    Approved,
}

impl AdjustmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentStatus::Pending => "pending",
            AdjustmentStatus::Approved => "approved",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AdjustmentStatus::Pending),
            "approved" => Some(AdjustmentStatus::Approved),
            _ => None,
        }
    }
}

/// Direction of a stock adjustment, derived from the variance sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
    Increase,
    Decrease,
}

impl AdjustmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentType::Increase => "increase",
            AdjustmentType::Decrease => "decrease",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "increase" => Some(AdjustmentType::Increase),
            "decrease" => Some(AdjustmentType::Decrease),
            _ => None,
        }
    }

    /// `None` for zero variance: nothing to adjust
    pub fn from_variance(variance_quantity: Decimal) -> Option<Self> {
        if variance_quantity > Decimal::ZERO {
            Some(AdjustmentType::Increase)
        } else if variance_quantity < Decimal::ZERO {
            Some(AdjustmentType::Decrease)
        } else {
            None
        }
    }
}

/// Counted minus recorded: positive means more on the shelf than the system
/// believed
pub fn variance_quantity(physical: Decimal, system: Decimal) -> Decimal {
    physical - system
}

/// Monetary impact of a variance at the snapshot unit cost
pub fn variance_value(variance_qty: Decimal, unit_cost: Decimal) -> Decimal {
    variance_qty * unit_cost
}

/// One counted line, as fed into the report summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceLine {
    pub item_name: String,
    pub system_quantity: Decimal,
    pub physical_quantity: Option<Decimal>,
    pub variance_quantity: Option<Decimal>,
    pub variance_value: Option<Decimal>,
}

/// Aggregate view over a stock take's lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceSummary {
    /// Lines in the snapshot
    pub total_items: usize,
    /// Lines with a submitted physical count
    pub items_counted: usize,
    /// Counted lines whose variance is non-zero
    pub items_with_variance: usize,
    /// Sum of variance values over counted lines (zero-variance included)
    pub total_variance_value: Decimal,
    pub positive_variances: usize,
    pub negative_variances: usize,
}

/// Summarize a stock take's lines. Uncounted lines contribute to
/// `total_items` only.
pub fn summarize_variances(lines: &[VarianceLine]) -> VarianceSummary {
    let mut summary = VarianceSummary {
        total_items: lines.len(),
        items_counted: 0,
        items_with_variance: 0,
        total_variance_value: Decimal::ZERO,
        positive_variances: 0,
        negative_variances: 0,
    };

    for line in lines {
        let (Some(vq), Some(vv)) = (line.variance_quantity, line.variance_value) else {
            continue;
        };
        summary.items_counted += 1;
        summary.total_variance_value += vv;
        if vq > Decimal::ZERO {
            summary.items_with_variance += 1;
            summary.positive_variances += 1;
        } else if vq < Decimal::ZERO {
            summary.items_with_variance += 1;
            summary.negative_variances += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_status_transitions_linear() {
        assert!(StockTakeStatus::Draft.can_transition_to(StockTakeStatus::InProgress));
        assert!(StockTakeStatus::InProgress.can_transition_to(StockTakeStatus::Completed));

        assert!(!StockTakeStatus::Draft.can_transition_to(StockTakeStatus::Completed));
        assert!(!StockTakeStatus::Completed.can_transition_to(StockTakeStatus::Draft));
        assert!(!StockTakeStatus::InProgress.can_transition_to(StockTakeStatus::Draft));
        assert!(!StockTakeStatus::Completed.can_transition_to(StockTakeStatus::InProgress));
    }

    #[test]
    fn test_counts_only_accepted_in_progress() {
        assert!(!StockTakeStatus::Draft.accepts_counts());
        assert!(StockTakeStatus::InProgress.accepts_counts());
        assert!(!StockTakeStatus::Completed.accepts_counts());
    }

    #[test]
    fn test_variance_arithmetic() {
        let vq = variance_quantity(dec("65"), dec("70"));
        assert_eq!(vq, dec("-5"));
        assert_eq!(variance_value(vq, dec("1.8")), dec("-9.0"));
    }

    #[test]
    fn test_adjustment_type_from_variance_sign() {
        assert_eq!(
            AdjustmentType::from_variance(dec("3")),
            Some(AdjustmentType::Increase)
        );
        assert_eq!(
            AdjustmentType::from_variance(dec("-3")),
            Some(AdjustmentType::Decrease)
        );
        assert_eq!(AdjustmentType::from_variance(Decimal::ZERO), None);
    }

    #[test]
    fn test_summary_counts_and_total() {
        let lines = vec![
            VarianceLine {
                item_name: "Sugar".to_string(),
                system_quantity: dec("70"),
                physical_quantity: Some(dec("65")),
                variance_quantity: Some(dec("-5")),
                variance_value: Some(dec("-9.0")),
            },
            VarianceLine {
                item_name: "Milk".to_string(),
                system_quantity: dec("20"),
                physical_quantity: Some(dec("22")),
                variance_quantity: Some(dec("2")),
                variance_value: Some(dec("3.0")),
            },
            VarianceLine {
                item_name: "Cones".to_string(),
                system_quantity: dec("100"),
                physical_quantity: Some(dec("100")),
                variance_quantity: Some(dec("0")),
                variance_value: Some(dec("0")),
            },
            VarianceLine {
                item_name: "Napkins".to_string(),
                system_quantity: dec("500"),
                physical_quantity: None,
                variance_quantity: None,
                variance_value: None,
            },
        ];

        let summary = summarize_variances(&lines);
        assert_eq!(summary.total_items, 4);
        assert_eq!(summary.items_counted, 3);
        assert_eq!(summary.items_with_variance, 2);
        assert_eq!(summary.positive_variances, 1);
        assert_eq!(summary.negative_variances, 1);
        // Zero-variance lines are included in the total
        assert_eq!(summary.total_variance_value, dec("-6.0"));
    }
}
