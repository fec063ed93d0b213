//! Recipe resolution service
//!
//! Thin DB-facing wrapper around the pure resolver in `shared`: fetches a
//! snapshot of the active catalog, expands the requested recipe against it,
//! and reports availability. Nothing here mutates stock.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;

use shared::{
    check_availability, resolve_recipe, AvailabilityReport, MatchCandidate, RecipeBook,
    RecipeResolution,
};

use crate::error::{AppError, AppResult};

/// Recipe service resolving composite products against live stock
#[derive(Clone)]
pub struct RecipeService {
    db: PgPool,
    recipes: Arc<RecipeBook>,
}

impl RecipeService {
    /// Create a new RecipeService instance
    pub fn new(db: PgPool, recipes: Arc<RecipeBook>) -> Self {
        Self { db, recipes }
    }

    /// Composite product names known to the recipe book
    pub fn product_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.recipes.product_names().map(String::from).collect();
        names.sort();
        names
    }

    /// Expand the recipe for `units_ordered` units of a composite product
    /// against the current catalog
    pub async fn resolve(
        &self,
        product: &str,
        units_ordered: Decimal,
    ) -> AppResult<RecipeResolution> {
        if units_ordered <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "units".to_string(),
                message: "Units ordered must be positive".to_string(),
            });
        }

        let ingredients = self
            .recipes
            .get(product)
            .ok_or_else(|| AppError::NotFound(format!("Recipe for \"{}\"", product)))?;

        let catalog = self.catalog_snapshot().await?;
        Ok(resolve_recipe(ingredients, units_ordered, &catalog))
    }

    /// Non-mutating availability check for a composite product order
    pub async fn check_availability(
        &self,
        product: &str,
        units_ordered: Decimal,
    ) -> AppResult<AvailabilityReport> {
        let resolution = self.resolve(product, units_ordered).await?;
        Ok(check_availability(&resolution))
    }

    /// Point-in-time view of the active catalog for matching. Ordered by
    /// name so substring ties resolve deterministically between calls.
    pub async fn catalog_snapshot(&self) -> AppResult<Vec<MatchCandidate>> {
        let rows = sqlx::query_as::<_, (uuid::Uuid, String, String, String, Decimal, Decimal)>(
            r#"
            SELECT id, name, category, unit, available_quantity, cost_per_unit
            FROM inventory_items
            WHERE is_active = TRUE
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, name, category, unit, available_quantity, cost_per_unit)| MatchCandidate {
                    id,
                    name,
                    category,
                    unit,
                    available_quantity,
                    cost_per_unit,
                },
            )
            .collect())
    }
}
