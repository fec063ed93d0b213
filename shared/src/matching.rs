//! Ingredient-to-catalog matching
//!
//! Recipes name ingredients loosely ("Vanilla Gelato") while the catalog
//! holds concrete stocked items. Matching runs an explicit ordered list of
//! strategies; the first strategy producing a hit wins. Ties within one
//! strategy resolve by snapshot iteration order, which is deliberately not
//! part of the contract.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog item as seen by the matcher: a point-in-time snapshot of the
/// active items, fetched once per resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub available_quantity: Decimal,
    pub cost_per_unit: Decimal,
}

/// Match strategies, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Case-sensitive exact name match
    ExactName,
    /// Case-insensitive substring match (either direction) within the
    /// ingredient's hinted category
    CategoryScopedSubstring,
    /// Case-insensitive substring match (either direction) over all items
    GlobalSubstring,
}

/// A successful match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngredientMatch<'a> {
    pub candidate: &'a MatchCandidate,
    pub strategy: MatchStrategy,
}

fn substring_either_way(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// Find the catalog item for an ingredient name, trying each strategy in
/// precedence order. `category_hint` narrows the substring search before
/// the global fallback runs.
pub fn find_match<'a>(
    candidates: &'a [MatchCandidate],
    ingredient_name: &str,
    category_hint: Option<&str>,
) -> Option<IngredientMatch<'a>> {
    if let Some(candidate) = candidates.iter().find(|c| c.name == ingredient_name) {
        return Some(IngredientMatch {
            candidate,
            strategy: MatchStrategy::ExactName,
        });
    }

    if let Some(hint) = category_hint {
        if let Some(candidate) = candidates
            .iter()
            .filter(|c| c.category.eq_ignore_ascii_case(hint))
            .find(|c| substring_either_way(&c.name, ingredient_name))
        {
            return Some(IngredientMatch {
                candidate,
                strategy: MatchStrategy::CategoryScopedSubstring,
            });
        }
    }

    candidates
        .iter()
        .find(|c| substring_either_way(&c.name, ingredient_name))
        .map(|candidate| IngredientMatch {
            candidate,
            strategy: MatchStrategy::GlobalSubstring,
        })
}
