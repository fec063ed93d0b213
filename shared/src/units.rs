//! Unit conversion between compatible measurement units
//!
//! Supports mass (g/kg), volume (ml/L) and the count family (pcs, pieces
//! and units, all equivalent). Conversion never fails: when no path between two
//! units exists the original quantity passes through unchanged, but the
//! outcome is reported so callers can decide whether to accept or reject.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A measurement unit known to the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Gram,
    Kilogram,
    Milliliter,
    Liter,
    Piece,
}

/// Unit families; conversion is only defined within a family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFamily {
    Mass,
    Volume,
    Count,
}

impl Unit {
    /// Parse a unit spelling as it appears in the catalog or a recipe.
    /// Count-family spellings (pcs, pieces, units...) all map to `Piece`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" => Some(Unit::Gram),
            "kg" | "kilogram" | "kilograms" => Some(Unit::Kilogram),
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                Some(Unit::Milliliter)
            }
            "l" | "liter" | "liters" | "litre" | "litres" => Some(Unit::Liter),
            "pc" | "pcs" | "piece" | "pieces" | "unit" | "units" => Some(Unit::Piece),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Milliliter => "ml",
            Unit::Liter => "l",
            Unit::Piece => "pcs",
        }
    }

    pub fn family(&self) -> UnitFamily {
        match self {
            Unit::Gram | Unit::Kilogram => UnitFamily::Mass,
            Unit::Milliliter | Unit::Liter => UnitFamily::Volume,
            Unit::Piece => UnitFamily::Count,
        }
    }

    /// Multiplier into the family's base unit (g, ml, pcs).
    fn base_factor(&self) -> Decimal {
        match self {
            Unit::Gram | Unit::Milliliter | Unit::Piece => Decimal::ONE,
            Unit::Kilogram | Unit::Liter => Decimal::from(1000),
        }
    }
}

/// How a conversion was performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// Source and target are the same unit; quantity returned unchanged
    Identity,
    /// A known conversion factor was applied
    Converted,
    /// No conversion path between the units; quantity returned unchanged.
    /// Callers must decide whether to proceed with the raw quantity.
    Unavailable,
}

/// Result of a unit conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    pub quantity: Decimal,
    pub outcome: ConversionOutcome,
}

impl Conversion {
    /// True when the quantity was passed through without a known path
    pub fn is_unavailable(&self) -> bool {
        self.outcome == ConversionOutcome::Unavailable
    }
}

/// Convert `quantity` from one unit spelling to another.
///
/// `convert(1500, "g", "kg")` yields `1.5`; `convert(3, "pcs", "pieces")`
/// yields `3` (count units are equivalent); `convert(5, "kg", "L")` yields
/// `5` with `ConversionOutcome::Unavailable` since mass and volume do not
/// convert without a density.
pub fn convert(quantity: Decimal, from: &str, to: &str) -> Conversion {
    if from.trim().eq_ignore_ascii_case(to.trim()) {
        return Conversion {
            quantity,
            outcome: ConversionOutcome::Identity,
        };
    }

    match (Unit::parse(from), Unit::parse(to)) {
        (Some(f), Some(t)) if f == t => Conversion {
            quantity,
            outcome: ConversionOutcome::Identity,
        },
        (Some(f), Some(t)) if f.family() == t.family() => Conversion {
            quantity: quantity * f.base_factor() / t.base_factor(),
            outcome: ConversionOutcome::Converted,
        },
        _ => Conversion {
            quantity,
            outcome: ConversionOutcome::Unavailable,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_gram_to_kilogram() {
        let result = convert(dec("1500"), "g", "kg");
        assert_eq!(result.quantity, dec("1.5"));
        assert_eq!(result.outcome, ConversionOutcome::Converted);
    }

    #[test]
    fn test_kilogram_to_gram() {
        let result = convert(dec("2.5"), "kg", "g");
        assert_eq!(result.quantity, dec("2500"));
        assert_eq!(result.outcome, ConversionOutcome::Converted);
    }

    #[test]
    fn test_milliliter_liter_round_trip() {
        let to_l = convert(dec("750"), "ml", "L");
        assert_eq!(to_l.quantity, dec("0.75"));
        let back = convert(to_l.quantity, "L", "ml");
        assert_eq!(back.quantity, dec("750"));
    }

    #[test]
    fn test_count_family_equivalent() {
        let result = convert(dec("3"), "pcs", "pieces");
        assert_eq!(result.quantity, dec("3"));
        assert_eq!(result.outcome, ConversionOutcome::Identity);
    }

    #[test]
    fn test_same_unit_identity() {
        let result = convert(dec("42"), "kg", "kg");
        assert_eq!(result.quantity, dec("42"));
        assert_eq!(result.outcome, ConversionOutcome::Identity);
    }

    #[test]
    fn test_cross_family_unavailable() {
        let result = convert(dec("5"), "kg", "L");
        assert_eq!(result.quantity, dec("5"));
        assert!(result.is_unavailable());
    }

    #[test]
    fn test_unknown_unit_unavailable() {
        let result = convert(dec("2"), "scoop", "kg");
        assert_eq!(result.quantity, dec("2"));
        assert!(result.is_unavailable());
    }

    #[test]
    fn test_unit_parse_spellings() {
        assert_eq!(Unit::parse("Kg"), Some(Unit::Kilogram));
        assert_eq!(Unit::parse(" pieces "), Some(Unit::Piece));
        assert_eq!(Unit::parse("litre"), Some(Unit::Liter));
        assert_eq!(Unit::parse("bag"), None);
    }
}
