//! Recipe configuration and resolution
//!
//! Composite products (a sundae, a milkshake) consume multiple catalog
//! ingredients per a fixed recipe. Recipes are static configuration loaded
//! at startup; resolution expands a recipe into concrete per-item
//! requirements against a catalog snapshot, converting each requirement
//! into the matched item's unit.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matching::{find_match, MatchCandidate, MatchStrategy};
use crate::units::convert;

/// One line of a composite-product recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    /// Ingredient name as written in the recipe (matched loosely)
    pub ingredient: String,
    /// Optional category hint to disambiguate the match
    #[serde(default)]
    pub category: Option<String>,
    /// Quantity required per single unit of the composite product
    pub quantity: Decimal,
    /// Unit the recipe quantity is expressed in
    pub unit: String,
}

/// Static map of composite product name to its ingredient list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeBook {
    recipes: HashMap<String, Vec<RecipeIngredient>>,
}

impl RecipeBook {
    /// Load the recipe book from its JSON configuration source
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Look up the recipe for a composite product. `None` means the
    /// product is not composite and callers treat it as atomic.
    pub fn get(&self, product: &str) -> Option<&[RecipeIngredient]> {
        self.recipes.get(product).map(Vec::as_slice)
    }

    pub fn product_names(&self) -> impl Iterator<Item = &str> {
        self.recipes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

/// A recipe line matched to a stocked item, quantity converted into the
/// item's unit and ready to deduct
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLine {
    pub ingredient: String,
    pub item_id: Uuid,
    pub item_name: String,
    pub item_unit: String,
    /// Quantity needed, expressed in the item's unit
    pub quantity: Decimal,
    pub strategy: MatchStrategy,
    /// Set when no conversion path existed between the recipe unit and the
    /// item unit; the raw recipe quantity passed through unchanged
    pub conversion_warning: bool,
    /// Item availability at snapshot time (advisory, not a reservation)
    pub available_quantity: Decimal,
    pub cost_per_unit: Decimal,
}

/// A recipe line with no catalog match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedLine {
    pub ingredient: String,
    pub quantity: Decimal,
    pub unit: String,
    pub reason: String,
}

/// Outcome of expanding one recipe against a catalog snapshot
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecipeResolution {
    pub resolved: Vec<ResolvedLine>,
    pub unresolved: Vec<UnresolvedLine>,
}

impl RecipeResolution {
    pub fn fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Expand a recipe for `units_ordered` units of the composite product.
///
/// Each ingredient requirement is `quantity × units_ordered`, matched to an
/// active catalog item (exact name, category-scoped substring, then global
/// substring) and converted into that item's unit. Lines that fail to match
/// land in `unresolved`; the expansion itself never fails.
pub fn resolve_recipe(
    ingredients: &[RecipeIngredient],
    units_ordered: Decimal,
    catalog: &[MatchCandidate],
) -> RecipeResolution {
    let mut resolution = RecipeResolution::default();

    for line in ingredients {
        let needed = line.quantity * units_ordered;

        match find_match(catalog, &line.ingredient, line.category.as_deref()) {
            Some(found) => {
                let converted = convert(needed, &line.unit, &found.candidate.unit);
                resolution.resolved.push(ResolvedLine {
                    ingredient: line.ingredient.clone(),
                    item_id: found.candidate.id,
                    item_name: found.candidate.name.clone(),
                    item_unit: found.candidate.unit.clone(),
                    quantity: converted.quantity,
                    strategy: found.strategy,
                    conversion_warning: converted.is_unavailable(),
                    available_quantity: found.candidate.available_quantity,
                    cost_per_unit: found.candidate.cost_per_unit,
                });
            }
            None => resolution.unresolved.push(UnresolvedLine {
                ingredient: line.ingredient.clone(),
                quantity: needed,
                unit: line.unit.clone(),
                reason: format!("no active catalog item matches \"{}\"", line.ingredient),
            }),
        }
    }

    resolution
}

/// Availability verdict for a composite product order
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub available: bool,
    /// One entry per blocking line, naming the ingredient
    pub reasons: Vec<String>,
}

/// Check a resolution against its snapshot quantities without mutating
/// anything. Advisory only: balances may move before a deduction runs.
pub fn check_availability(resolution: &RecipeResolution) -> AvailabilityReport {
    let mut reasons = Vec::new();

    for line in &resolution.unresolved {
        reasons.push(format!("{}: {}", line.ingredient, line.reason));
    }

    for line in &resolution.resolved {
        if line.available_quantity < line.quantity {
            reasons.push(format!(
                "{}: insufficient stock of \"{}\" (available {} {}, required {} {})",
                line.ingredient,
                line.item_name,
                line.available_quantity,
                line.item_unit,
                line.quantity,
                line.item_unit,
            ));
        }
    }

    AvailabilityReport {
        available: reasons.is_empty(),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn candidate(name: &str, category: &str, unit: &str, available: &str) -> MatchCandidate {
        MatchCandidate {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: category.to_string(),
            unit: unit.to_string(),
            available_quantity: dec(available),
            cost_per_unit: dec("2.5"),
        }
    }

    fn sundae_recipe() -> Vec<RecipeIngredient> {
        vec![
            RecipeIngredient {
                ingredient: "Vanilla Gelato".to_string(),
                category: Some("gelato".to_string()),
                quantity: dec("2"),
                unit: "kg".to_string(),
            },
            RecipeIngredient {
                ingredient: "Waffle Stick".to_string(),
                category: None,
                quantity: dec("2"),
                unit: "pcs".to_string(),
            },
        ]
    }

    #[test]
    fn test_recipe_book_from_json() {
        let json = r#"{
            "Turtle Sundae": [
                { "ingredient": "Vanilla Gelato", "category": "gelato", "quantity": "2", "unit": "kg" },
                { "ingredient": "Waffle Stick", "quantity": "2", "unit": "pcs" }
            ]
        }"#;
        let book = RecipeBook::from_json_str(json).unwrap();
        assert_eq!(book.len(), 1);
        assert_eq!(book.get("Turtle Sundae").unwrap().len(), 2);
        assert!(book.get("Affogato").is_none());
    }

    #[test]
    fn test_resolution_scales_by_units_ordered() {
        let catalog = vec![
            candidate("Vanilla Gelato", "gelato", "kg", "10"),
            candidate("Waffle Stick", "cones", "pcs", "50"),
        ];
        let resolution = resolve_recipe(&sundae_recipe(), dec("3"), &catalog);
        assert!(resolution.fully_resolved());
        assert_eq!(resolution.resolved[0].quantity, dec("6"));
        assert_eq!(resolution.resolved[1].quantity, dec("6"));
    }

    #[test]
    fn test_resolution_converts_into_item_unit() {
        // Recipe in kg, catalog stocked in grams
        let catalog = vec![candidate("Vanilla Gelato", "gelato", "g", "10000")];
        let recipe = vec![RecipeIngredient {
            ingredient: "Vanilla Gelato".to_string(),
            category: None,
            quantity: dec("2"),
            unit: "kg".to_string(),
        }];
        let resolution = resolve_recipe(&recipe, dec("1"), &catalog);
        assert_eq!(resolution.resolved[0].quantity, dec("2000"));
        assert!(!resolution.resolved[0].conversion_warning);
    }

    #[test]
    fn test_resolution_flags_missing_conversion_path() {
        // Recipe in pieces, catalog stocked in kg: no path, raw quantity kept
        let catalog = vec![candidate("Fudge Block", "toppings", "kg", "4")];
        let recipe = vec![RecipeIngredient {
            ingredient: "Fudge Block".to_string(),
            category: None,
            quantity: dec("1"),
            unit: "pcs".to_string(),
        }];
        let resolution = resolve_recipe(&recipe, dec("2"), &catalog);
        assert_eq!(resolution.resolved[0].quantity, dec("2"));
        assert!(resolution.resolved[0].conversion_warning);
    }

    #[test]
    fn test_unmatched_ingredient_is_unresolved_not_fatal() {
        let catalog = vec![candidate("Waffle Stick", "cones", "pcs", "50")];
        let resolution = resolve_recipe(&sundae_recipe(), dec("1"), &catalog);
        assert_eq!(resolution.resolved.len(), 1);
        assert_eq!(resolution.unresolved.len(), 1);
        assert_eq!(resolution.unresolved[0].ingredient, "Vanilla Gelato");
    }

    #[test]
    fn test_availability_insufficient_names_ingredient() {
        let catalog = vec![
            candidate("Vanilla Gelato", "gelato", "kg", "0.5"),
            candidate("Waffle Stick", "cones", "pcs", "50"),
        ];
        let resolution = resolve_recipe(&sundae_recipe(), dec("1"), &catalog);
        let report = check_availability(&resolution);
        assert!(!report.available);
        assert_eq!(report.reasons.len(), 1);
        assert!(report.reasons[0].contains("Vanilla Gelato"));
    }

    #[test]
    fn test_availability_ok() {
        let catalog = vec![
            candidate("Vanilla Gelato", "gelato", "kg", "10"),
            candidate("Waffle Stick", "cones", "pcs", "50"),
        ];
        let resolution = resolve_recipe(&sundae_recipe(), dec("2"), &catalog);
        let report = check_availability(&resolution);
        assert!(report.available);
        assert!(report.reasons.is_empty());
    }
}
