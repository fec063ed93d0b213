//! Inventory catalog service: stocked item management
//!
//! Quantities are never edited here; every change to `available_quantity`
//! flows through the movement ledger. This service owns the item metadata
//! and the soft-delete (archive) lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{validate_name, validate_non_negative_amount, validate_stock_levels};

use crate::error::{AppError, AppResult};

/// Catalog service for managing stocked items
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// A stocked catalog entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
    /// Currently usable stock; mutated only through ledger movements
    pub available_quantity: Decimal,
    /// Cumulative quantity ever received (lifetime counter, not a ceiling)
    pub total_quantity: Decimal,
    pub cost_per_unit: Decimal,
    pub price_per_unit: Decimal,
    pub min_stock_level: Decimal,
    pub max_stock_level: Decimal,
    pub reorder_point: Decimal,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ITEM_COLUMNS: &str = "id, name, category, unit, available_quantity, total_quantity, \
                            cost_per_unit, price_per_unit, min_stock_level, max_stock_level, \
                            reorder_point, location, is_active, created_at, updated_at";

/// Input for creating a catalog item. Items start with zero stock; initial
/// stock arrives via a replenishment movement.
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub cost_per_unit: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
    pub min_stock_level: Option<Decimal>,
    pub max_stock_level: Option<Decimal>,
    pub reorder_point: Option<Decimal>,
    pub location: Option<String>,
}

/// Input for updating item metadata (never quantities)
#[derive(Debug, Deserialize)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub cost_per_unit: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
    pub min_stock_level: Option<Decimal>,
    pub max_stock_level: Option<Decimal>,
    pub reorder_point: Option<Decimal>,
    pub location: Option<String>,
}

/// Filters for listing items
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsQuery {
    pub category: Option<String>,
    /// Include archived items (default: active only)
    #[serde(default)]
    pub include_archived: bool,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a catalog item
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<InventoryItem> {
        validate_name(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        if input.unit.trim().is_empty() {
            return Err(AppError::Validation {
                field: "unit".to_string(),
                message: "Unit of measure is required".to_string(),
            });
        }

        let cost_per_unit = input.cost_per_unit.unwrap_or(Decimal::ZERO);
        let price_per_unit = input.price_per_unit.unwrap_or(Decimal::ZERO);
        for (field, amount) in [("cost_per_unit", cost_per_unit), ("price_per_unit", price_per_unit)] {
            validate_non_negative_amount(amount).map_err(|msg| AppError::Validation {
                field: field.to_string(),
                message: msg.to_string(),
            })?;
        }

        let min_stock_level = input.min_stock_level.unwrap_or(Decimal::ZERO);
        let max_stock_level = input.max_stock_level.unwrap_or(Decimal::ZERO);
        let reorder_point = input.reorder_point.unwrap_or(Decimal::ZERO);
        validate_stock_levels(min_stock_level, max_stock_level, reorder_point).map_err(|msg| {
            AppError::Validation {
                field: "stock_levels".to_string(),
                message: msg.to_string(),
            }
        })?;

        // Item names must be unique among active items for recipe matching
        let duplicate = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory_items WHERE name = $1 AND is_active = TRUE)",
        )
        .bind(&input.name)
        .fetch_one(&self.db)
        .await?;

        if duplicate {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }

        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            INSERT INTO inventory_items (
                name, category, unit, cost_per_unit, price_per_unit,
                min_stock_level, max_stock_level, reorder_point, location
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.category)
        .bind(&input.unit)
        .bind(cost_per_unit)
        .bind(price_per_unit)
        .bind(min_stock_level)
        .bind(max_stock_level)
        .bind(reorder_point)
        .bind(&input.location)
        .fetch_one(&self.db)
        .await?;

        Ok(item)
    }

    /// Get an item by ID
    pub async fn get_item(&self, item_id: Uuid) -> AppResult<InventoryItem> {
        sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1"
        ))
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))
    }

    /// List items, optionally filtered by category
    pub async fn list_items(&self, query: ListItemsQuery) -> AppResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM inventory_items
            WHERE ($1::TEXT IS NULL OR category = $1)
              AND (is_active = TRUE OR $2 = TRUE)
            ORDER BY name
            "#
        ))
        .bind(&query.category)
        .bind(query.include_archived)
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    /// Update item metadata
    pub async fn update_item(
        &self,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> AppResult<InventoryItem> {
        let existing = self.get_item(item_id).await?;

        let name = input.name.unwrap_or(existing.name);
        validate_name(&name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        let min_stock_level = input.min_stock_level.unwrap_or(existing.min_stock_level);
        let max_stock_level = input.max_stock_level.unwrap_or(existing.max_stock_level);
        let reorder_point = input.reorder_point.unwrap_or(existing.reorder_point);
        validate_stock_levels(min_stock_level, max_stock_level, reorder_point).map_err(|msg| {
            AppError::Validation {
                field: "stock_levels".to_string(),
                message: msg.to_string(),
            }
        })?;

        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            UPDATE inventory_items
            SET name = $1, category = $2, unit = $3, cost_per_unit = $4, price_per_unit = $5,
                min_stock_level = $6, max_stock_level = $7, reorder_point = $8,
                location = $9, updated_at = NOW()
            WHERE id = $10
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(input.category.unwrap_or(existing.category))
        .bind(input.unit.unwrap_or(existing.unit))
        .bind(input.cost_per_unit.unwrap_or(existing.cost_per_unit))
        .bind(input.price_per_unit.unwrap_or(existing.price_per_unit))
        .bind(min_stock_level)
        .bind(max_stock_level)
        .bind(reorder_point)
        .bind(input.location.or(existing.location))
        .bind(item_id)
        .fetch_one(&self.db)
        .await?;

        Ok(item)
    }

    /// Archive an item (soft delete, preserving movement history)
    pub async fn archive_item(&self, item_id: Uuid) -> AppResult<InventoryItem> {
        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            UPDATE inventory_items
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        tracing::info!("Archived inventory item {} ({})", item.name, item.id);
        Ok(item)
    }

    /// Items at or below their reorder point (reorder point of zero means
    /// no reordering configured)
    pub async fn low_stock_items(&self) -> AppResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM inventory_items
            WHERE is_active = TRUE
              AND reorder_point > 0
              AND available_quantity <= reorder_point
            ORDER BY available_quantity / reorder_point
            "#
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }
}
