//! Movement ledger service
//!
//! Appends signed stock movements and keeps item quantities consistent with
//! the movement log. Every apply runs as one transaction with the item row
//! locked (`SELECT ... FOR UPDATE`): read, validate, write the new quantity,
//! insert the movement row, commit. Two concurrent depletions can therefore
//! never both pass the sufficiency check against a stale balance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{next_quantity, LedgerViolation, MovementDirection, MovementKind, StockEffect};

use crate::error::{AppError, AppResult};

/// Ledger service for applying and reading stock movements
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// One appended stock movement (audit record, never mutated)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Movement {
    pub id: Uuid,
    pub item_id: Uuid,
    pub kind: String,
    /// Positive magnitude of the movement
    pub quantity: Decimal,
    /// Signed effect on the item's available quantity
    pub quantity_delta: Decimal,
    pub unit_cost: Decimal,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    /// Links the two legs of a transfer
    pub transfer_group_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

const MOVEMENT_COLUMNS: &str = "id, item_id, kind, quantity, quantity_delta, unit_cost, \
                                reference_type, reference_id, transfer_group_id, notes, \
                                created_by, created_at";

/// Input for applying a movement
#[derive(Debug, Deserialize)]
pub struct ApplyMovementInput {
    pub item_id: Uuid,
    pub kind: MovementKind,
    /// Required for all kinds except `adjustment`
    pub quantity: Option<Decimal>,
    /// Absolute target, `adjustment` only
    pub target_quantity: Option<Decimal>,
    /// Required for `transfer`
    pub destination_item_id: Option<Uuid>,
    pub unit_cost: Option<Decimal>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    /// Explicit override allowing a depletion to drive the balance negative
    #[serde(default)]
    pub allow_negative: bool,
}

/// Ledger view of an item row while its lock is held
#[derive(Debug, FromRow)]
pub(crate) struct LockedItem {
    pub(crate) name: String,
    pub(crate) available_quantity: Decimal,
    pub(crate) cost_per_unit: Decimal,
}

/// Balance audit for one item: the stored quantity against the ledger sum
#[derive(Debug, Serialize)]
pub struct BalanceAudit {
    pub item_id: Uuid,
    pub item_name: String,
    pub available_quantity: Decimal,
    pub total_quantity: Decimal,
    /// Sum of signed deltas over all movements for this item
    pub ledger_delta_sum: Decimal,
    /// Holds whenever every change went through the ledger
    pub consistent: bool,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Apply one movement (or a linked pair, for transfers).
    ///
    /// Returns the appended movement rows: one for most kinds, two for a
    /// transfer (source leg first).
    pub async fn apply_movement(
        &self,
        actor: Uuid,
        input: ApplyMovementInput,
    ) -> AppResult<Vec<Movement>> {
        match input.kind.direction() {
            MovementDirection::Transfer => self.apply_transfer(actor, input).await,
            _ => {
                let movement = self.apply_single(actor, input).await?;
                Ok(vec![movement])
            }
        }
    }

    async fn apply_single(&self, actor: Uuid, input: ApplyMovementInput) -> AppResult<Movement> {
        let effect = match input.kind.direction() {
            MovementDirection::Inbound => StockEffect::Replenish(required_quantity(&input)?),
            MovementDirection::Outbound => StockEffect::Deplete(required_quantity(&input)?),
            MovementDirection::Absolute => {
                let target = input.target_quantity.ok_or_else(|| AppError::Validation {
                    field: "target_quantity".to_string(),
                    message: "Adjustment movements require a target quantity".to_string(),
                })?;
                StockEffect::SetTo(target)
            }
            MovementDirection::Transfer => unreachable!("transfer handled separately"),
        };

        let mut tx = self.db.begin().await?;

        let item = lock_item(&mut tx, input.item_id).await?;
        let change = next_quantity(item.available_quantity, effect, input.allow_negative)
            .map_err(|v| violation_error(v, &item.name))?;

        let unit_cost = input.unit_cost.unwrap_or(item.cost_per_unit);

        sqlx::query(
            r#"
            UPDATE inventory_items
            SET available_quantity = $1,
                total_quantity = total_quantity + $2,
                cost_per_unit = $3,
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(change.new_available)
        .bind(if change.accrues_total {
            change.delta
        } else {
            Decimal::ZERO
        })
        .bind(if change.accrues_total {
            // Replenishment carries the latest acquisition cost
            unit_cost
        } else {
            item.cost_per_unit
        })
        .bind(input.item_id)
        .execute(&mut *tx)
        .await?;

        let movement = insert_movement(
            &mut tx,
            NewMovement {
                item_id: input.item_id,
                kind: input.kind,
                quantity: change.delta.abs(),
                quantity_delta: change.delta,
                unit_cost,
                reference_type: input.reference_type.as_deref(),
                reference_id: input.reference_id,
                transfer_group_id: None,
                notes: input.notes.as_deref(),
                created_by: actor,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Applied {} movement of {} to item {} (new available: {})",
            movement.kind,
            movement.quantity,
            item.name,
            change.new_available
        );

        Ok(movement)
    }

    /// Transfer stock between two items as one atomic unit: both rows are
    /// locked in a stable order, both legs commit or neither does.
    /// Lifetime totals do not accrue: stock moved, not received.
    async fn apply_transfer(
        &self,
        actor: Uuid,
        input: ApplyMovementInput,
    ) -> AppResult<Vec<Movement>> {
        let quantity = required_quantity(&input)?;
        let destination_id = input.destination_item_id.ok_or_else(|| AppError::Validation {
            field: "destination_item_id".to_string(),
            message: "Transfer movements require a destination item".to_string(),
        })?;

        if destination_id == input.item_id {
            return Err(AppError::Validation {
                field: "destination_item_id".to_string(),
                message: "Cannot transfer an item to itself".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        // Stable lock order prevents deadlocks between opposing transfers
        let (first, second) = if input.item_id < destination_id {
            (input.item_id, destination_id)
        } else {
            (destination_id, input.item_id)
        };
        let first_item = lock_item(&mut tx, first).await?;
        let second_item = lock_item(&mut tx, second).await?;
        let (source, destination) = if first == input.item_id {
            (first_item, second_item)
        } else {
            (second_item, first_item)
        };

        let source_change = next_quantity(
            source.available_quantity,
            StockEffect::Deplete(quantity),
            input.allow_negative,
        )
        .map_err(|v| violation_error(v, &source.name))?;

        let unit_cost = input.unit_cost.unwrap_or(source.cost_per_unit);
        let transfer_group_id = Uuid::new_v4();

        sqlx::query(
            "UPDATE inventory_items SET available_quantity = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(source_change.new_available)
        .bind(input.item_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE inventory_items SET available_quantity = available_quantity + $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(quantity)
        .bind(destination_id)
        .execute(&mut *tx)
        .await?;

        let source_leg = insert_movement(
            &mut tx,
            NewMovement {
                item_id: input.item_id,
                kind: MovementKind::Transfer,
                quantity,
                quantity_delta: -quantity,
                unit_cost,
                reference_type: input.reference_type.as_deref(),
                reference_id: input.reference_id,
                transfer_group_id: Some(transfer_group_id),
                notes: input.notes.as_deref(),
                created_by: actor,
            },
        )
        .await?;

        let destination_leg = insert_movement(
            &mut tx,
            NewMovement {
                item_id: destination_id,
                kind: MovementKind::Transfer,
                quantity,
                quantity_delta: quantity,
                unit_cost,
                reference_type: input.reference_type.as_deref(),
                reference_id: input.reference_id,
                transfer_group_id: Some(transfer_group_id),
                notes: input.notes.as_deref(),
                created_by: actor,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Transferred {} from {} to {} (group {})",
            quantity,
            source.name,
            destination.name,
            transfer_group_id
        );

        Ok(vec![source_leg, destination_leg])
    }

    /// Movements for one item, most recent first
    pub async fn list_movements(&self, item_id: Uuid) -> AppResult<Vec<Movement>> {
        let item_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM inventory_items WHERE id = $1)")
                .bind(item_id)
                .fetch_one(&self.db)
                .await?;

        if !item_exists {
            return Err(AppError::NotFound("Inventory item".to_string()));
        }

        let movements = sqlx::query_as::<_, Movement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE item_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Audit an item's stored quantity against the sum of its ledger deltas
    pub async fn get_balance(&self, item_id: Uuid) -> AppResult<BalanceAudit> {
        let row = sqlx::query_as::<_, (String, Decimal, Decimal, Decimal)>(
            r#"
            SELECT i.name, i.available_quantity, i.total_quantity,
                   COALESCE(SUM(m.quantity_delta), 0) AS ledger_delta_sum
            FROM inventory_items i
            LEFT JOIN stock_movements m ON m.item_id = i.id
            WHERE i.id = $1
            GROUP BY i.id, i.name, i.available_quantity, i.total_quantity
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        Ok(BalanceAudit {
            item_id,
            item_name: row.0,
            available_quantity: row.1,
            total_quantity: row.2,
            ledger_delta_sum: row.3,
            consistent: row.1 == row.3,
        })
    }
}

fn required_quantity(input: &ApplyMovementInput) -> AppResult<Decimal> {
    input.quantity.ok_or_else(|| AppError::Validation {
        field: "quantity".to_string(),
        message: "Quantity is required for this movement kind".to_string(),
    })
}

fn violation_error(violation: LedgerViolation, item_name: &str) -> AppError {
    match violation {
        LedgerViolation::NonPositiveQuantity => AppError::Validation {
            field: "quantity".to_string(),
            message: "Quantity must be positive".to_string(),
        },
        LedgerViolation::NegativeTarget => AppError::Validation {
            field: "target_quantity".to_string(),
            message: "Adjustment target cannot be negative".to_string(),
        },
        LedgerViolation::InsufficientStock {
            available,
            requested,
        } => AppError::InsufficientStock(format!(
            "\"{}\": available {}, requested {}",
            item_name, available, requested
        )),
    }
}

pub(crate) async fn lock_item(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Uuid,
) -> AppResult<LockedItem> {
    sqlx::query_as::<_, LockedItem>(
        r#"
        SELECT name, available_quantity, cost_per_unit
        FROM inventory_items
        WHERE id = $1 AND is_active = TRUE
        FOR UPDATE
        "#,
    )
    .bind(item_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))
}

pub(crate) struct NewMovement<'a> {
    pub(crate) item_id: Uuid,
    pub(crate) kind: MovementKind,
    pub(crate) quantity: Decimal,
    pub(crate) quantity_delta: Decimal,
    pub(crate) unit_cost: Decimal,
    pub(crate) reference_type: Option<&'a str>,
    pub(crate) reference_id: Option<Uuid>,
    pub(crate) transfer_group_id: Option<Uuid>,
    pub(crate) notes: Option<&'a str>,
    pub(crate) created_by: Uuid,
}

pub(crate) async fn insert_movement(
    tx: &mut Transaction<'_, Postgres>,
    new: NewMovement<'_>,
) -> AppResult<Movement> {
    let movement = sqlx::query_as::<_, Movement>(&format!(
        r#"
        INSERT INTO stock_movements (
            item_id, kind, quantity, quantity_delta, unit_cost,
            reference_type, reference_id, transfer_group_id, notes, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {MOVEMENT_COLUMNS}
        "#
    ))
    .bind(new.item_id)
    .bind(new.kind.as_str())
    .bind(new.quantity)
    .bind(new.quantity_delta)
    .bind(new.unit_cost)
    .bind(new.reference_type)
    .bind(new.reference_id)
    .bind(new.transfer_group_id)
    .bind(new.notes)
    .bind(new.created_by)
    .fetch_one(&mut **tx)
    .await?;

    Ok(movement)
}
