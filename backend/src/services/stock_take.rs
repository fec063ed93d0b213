//! Stock-take workflow service
//!
//! Physical count reconciliation: snapshot the catalog, collect counts,
//! complete, then turn non-zero variances into pending adjustments that
//! apply to stock only on approval. Status transitions and variance
//! arithmetic live in `shared::stocktake`; this service owns persistence
//! and the transactional boundaries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{
    next_quantity, summarize_variances, validate_name, validate_physical_quantity,
    variance_quantity, variance_value, AdjustmentStatus, AdjustmentType, MovementKind,
    StockEffect, StockTakeStatus, VarianceLine, VarianceSummary,
};

use crate::error::{AppError, AppResult};
use crate::services::ledger::{insert_movement, lock_item, NewMovement};

/// Stock-take service
#[derive(Clone)]
pub struct StockTakeService {
    db: PgPool,
}

/// A stock-take header row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockTake {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub total_items_counted: i32,
    pub total_variance_value: Decimal,
    pub created_by: Uuid,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Stamped when the last pending adjustment is approved
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const TAKE_COLUMNS: &str = "id, title, description, location, status, total_items_counted, \
                            total_variance_value, created_by, started_at, completed_at, \
                            approved_by, approved_at, created_at, updated_at";

/// One snapshot line of a stock take
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockTakeItem {
    pub id: Uuid,
    pub stock_take_id: Uuid,
    pub item_id: Uuid,
    /// Item identity frozen at snapshot time
    pub item_name: String,
    pub category: String,
    pub unit: String,
    pub system_quantity: Decimal,
    pub unit_cost: Decimal,
    pub physical_quantity: Option<Decimal>,
    pub variance_quantity: Option<Decimal>,
    pub variance_value: Option<Decimal>,
    pub notes: Option<String>,
    pub counted_by: Option<Uuid>,
    pub counted_at: Option<DateTime<Utc>>,
}

const LINE_COLUMNS: &str = "id, stock_take_id, item_id, item_name, category, unit, \
                            system_quantity, unit_cost, physical_quantity, variance_quantity, \
                            variance_value, notes, counted_by, counted_at";

/// A reconciliation adjustment awaiting (or past) approval
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockAdjustment {
    pub id: Uuid,
    pub stock_take_id: Uuid,
    pub stock_take_item_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub adjustment_type: String,
    pub quantity_before: Decimal,
    pub quantity_after: Decimal,
    pub variance_quantity: Decimal,
    pub variance_value: Decimal,
    /// Snapshot cost the variance was valued at
    pub unit_cost: Decimal,
    pub reason: Option<String>,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
}

const ADJUSTMENT_COLUMNS: &str = "id, stock_take_id, stock_take_item_id, item_id, item_name, \
                                  adjustment_type, quantity_before, quantity_after, \
                                  variance_quantity, variance_value, unit_cost, reason, status, \
                                  created_by, created_at, approved_by, approved_at";

/// Input for creating a stock take
#[derive(Debug, Deserialize)]
pub struct CreateStockTakeInput {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// Input for recording one physical count
#[derive(Debug, Deserialize)]
pub struct RecordCountInput {
    pub physical_quantity: Decimal,
    pub notes: Option<String>,
}

/// A stock take with its snapshot lines
#[derive(Debug, Serialize)]
pub struct StockTakeDetail {
    #[serde(flatten)]
    pub take: StockTake,
    pub items: Vec<StockTakeItem>,
}

/// Read-only variance report over a stock take
#[derive(Debug, Serialize)]
pub struct VarianceReport {
    pub stock_take_id: Uuid,
    pub title: String,
    pub status: String,
    pub summary: VarianceSummary,
    pub lines: Vec<VarianceLine>,
}

impl StockTakeService {
    /// Create a new StockTakeService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a stock take in `draft`
    pub async fn create(&self, actor: Uuid, input: CreateStockTakeInput) -> AppResult<StockTake> {
        validate_name(&input.title).map_err(|msg| AppError::Validation {
            field: "title".to_string(),
            message: msg.to_string(),
        })?;

        let take = sqlx::query_as::<_, StockTake>(&format!(
            r#"
            INSERT INTO stock_takes (title, description, location, status, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TAKE_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.location)
        .bind(StockTakeStatus::Draft.as_str())
        .bind(actor)
        .fetch_one(&self.db)
        .await?;

        Ok(take)
    }

    /// List stock takes, most recent first
    pub async fn list(&self) -> AppResult<Vec<StockTake>> {
        let takes = sqlx::query_as::<_, StockTake>(&format!(
            "SELECT {TAKE_COLUMNS} FROM stock_takes ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(takes)
    }

    /// Get a stock take with its snapshot lines
    pub async fn get(&self, take_id: Uuid) -> AppResult<StockTakeDetail> {
        let take = self.fetch_take(take_id).await?;

        let items = sqlx::query_as::<_, StockTakeItem>(&format!(
            r#"
            SELECT {LINE_COLUMNS}
            FROM stock_take_items
            WHERE stock_take_id = $1
            ORDER BY item_name
            "#
        ))
        .bind(take_id)
        .fetch_all(&self.db)
        .await?;

        Ok(StockTakeDetail { take, items })
    }

    /// Move a draft take to `in_progress` and snapshot the active catalog.
    ///
    /// The transition and the snapshot commit together, so every line's
    /// system quantity reflects one consistent point in time. Items created
    /// after the snapshot are not retroactively included.
    pub async fn start(&self, take_id: Uuid, actor: Uuid) -> AppResult<StockTakeDetail> {
        let mut tx = self.db.begin().await?;

        let status = lock_take_status(&mut tx, take_id).await?;
        require_transition(status, StockTakeStatus::InProgress)?;

        sqlx::query(
            r#"
            UPDATE stock_takes
            SET status = $1, started_at = NOW(), updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(StockTakeStatus::InProgress.as_str())
        .bind(take_id)
        .execute(&mut *tx)
        .await?;

        let snapshot_count = sqlx::query(
            r#"
            INSERT INTO stock_take_items (
                stock_take_id, item_id, item_name, category, unit,
                system_quantity, unit_cost
            )
            SELECT $1, id, name, category, unit, available_quantity, cost_per_unit
            FROM inventory_items
            WHERE is_active = TRUE
            "#,
        )
        .bind(take_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        tracing::info!(
            "Stock take {} started by {} with {} snapshot lines",
            take_id,
            actor,
            snapshot_count
        );

        self.get(take_id).await
    }

    /// Record (or overwrite) a physical count on one line
    pub async fn record_count(
        &self,
        line_id: Uuid,
        actor: Uuid,
        input: RecordCountInput,
    ) -> AppResult<StockTakeItem> {
        validate_physical_quantity(input.physical_quantity).map_err(|msg| {
            AppError::Validation {
                field: "physical_quantity".to_string(),
                message: msg.to_string(),
            }
        })?;

        // Lock the parent take so a concurrent complete() cannot commit
        // between the status check and the line update, which would strand
        // a count outside the persisted totals.
        let mut tx = self.db.begin().await?;

        let parent = sqlx::query_as::<_, (Decimal, Decimal, String)>(
            r#"
            SELECT i.system_quantity, i.unit_cost, t.status
            FROM stock_take_items i
            JOIN stock_takes t ON t.id = i.stock_take_id
            WHERE i.id = $1
            FOR UPDATE OF t
            "#,
        )
        .bind(line_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock take line".to_string()))?;

        let (system_quantity, unit_cost, status) = parent;
        if !parse_status(&status)?.accepts_counts() {
            return Err(AppError::InvalidStateTransition(format!(
                "Counts can only be recorded while a stock take is in progress (current status: {})",
                status
            )));
        }

        let vq = variance_quantity(input.physical_quantity, system_quantity);
        let vv = variance_value(vq, unit_cost);

        let line = sqlx::query_as::<_, StockTakeItem>(&format!(
            r#"
            UPDATE stock_take_items
            SET physical_quantity = $1, variance_quantity = $2, variance_value = $3,
                notes = $4, counted_by = $5, counted_at = NOW()
            WHERE id = $6
            RETURNING {LINE_COLUMNS}
            "#
        ))
        .bind(input.physical_quantity)
        .bind(vq)
        .bind(vv)
        .bind(&input.notes)
        .bind(actor)
        .bind(line_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(line)
    }

    /// Complete an in-progress take, persisting its count totals
    pub async fn complete(&self, take_id: Uuid, actor: Uuid) -> AppResult<StockTake> {
        let mut tx = self.db.begin().await?;

        let status = lock_take_status(&mut tx, take_id).await?;
        require_transition(status, StockTakeStatus::Completed)?;

        let (counted, total_variance) = sqlx::query_as::<_, (i64, Decimal)>(
            r#"
            SELECT COUNT(*), COALESCE(SUM(variance_value), 0)
            FROM stock_take_items
            WHERE stock_take_id = $1 AND physical_quantity IS NOT NULL
            "#,
        )
        .bind(take_id)
        .fetch_one(&mut *tx)
        .await?;

        let take = sqlx::query_as::<_, StockTake>(&format!(
            r#"
            UPDATE stock_takes
            SET status = $1, total_items_counted = $2, total_variance_value = $3,
                completed_at = NOW(), updated_at = NOW()
            WHERE id = $4
            RETURNING {TAKE_COLUMNS}
            "#
        ))
        .bind(StockTakeStatus::Completed.as_str())
        .bind(counted as i32)
        .bind(total_variance)
        .bind(take_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Stock take {} completed by {}: {} lines counted, variance value {}",
            take_id,
            actor,
            counted,
            total_variance
        );

        Ok(take)
    }

    /// Create pending adjustments for every counted line with a non-zero
    /// variance. Idempotent per take: a repeat call returns the existing
    /// adjustments instead of duplicating them.
    pub async fn generate_adjustments(
        &self,
        take_id: Uuid,
        actor: Uuid,
    ) -> AppResult<Vec<StockAdjustment>> {
        let mut tx = self.db.begin().await?;

        let status = lock_take_status(&mut tx, take_id).await?;
        if parse_status(&status)? != StockTakeStatus::Completed {
            return Err(AppError::InvalidStateTransition(format!(
                "Adjustments can only be generated for a completed stock take (current status: {})",
                status
            )));
        }

        let existing = sqlx::query_as::<_, StockAdjustment>(&format!(
            r#"
            SELECT {ADJUSTMENT_COLUMNS}
            FROM stock_adjustments
            WHERE stock_take_id = $1
            ORDER BY item_name
            "#
        ))
        .bind(take_id)
        .fetch_all(&mut *tx)
        .await?;

        if !existing.is_empty() {
            tx.commit().await?;
            return Ok(existing);
        }

        let lines = sqlx::query_as::<_, StockTakeItem>(&format!(
            r#"
            SELECT {LINE_COLUMNS}
            FROM stock_take_items
            WHERE stock_take_id = $1 AND physical_quantity IS NOT NULL
            ORDER BY item_name
            "#
        ))
        .bind(take_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut adjustments = Vec::new();
        for line in lines {
            let (Some(physical), Some(vq), Some(vv)) = (
                line.physical_quantity,
                line.variance_quantity,
                line.variance_value,
            ) else {
                continue;
            };
            let Some(adjustment_type) = AdjustmentType::from_variance(vq) else {
                continue;
            };

            let adjustment = sqlx::query_as::<_, StockAdjustment>(&format!(
                r#"
                INSERT INTO stock_adjustments (
                    stock_take_id, stock_take_item_id, item_id, item_name,
                    adjustment_type, quantity_before, quantity_after,
                    variance_quantity, variance_value, unit_cost, reason,
                    status, created_by
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING {ADJUSTMENT_COLUMNS}
                "#
            ))
            .bind(take_id)
            .bind(line.id)
            .bind(line.item_id)
            .bind(&line.item_name)
            .bind(adjustment_type.as_str())
            .bind(line.system_quantity)
            .bind(physical)
            .bind(vq)
            .bind(vv)
            .bind(line.unit_cost)
            .bind(&line.notes)
            .bind(AdjustmentStatus::Pending.as_str())
            .bind(actor)
            .fetch_one(&mut *tx)
            .await?;

            adjustments.push(adjustment);
        }

        tx.commit().await?;

        tracing::info!(
            "Generated {} adjustments for stock take {}",
            adjustments.len(),
            take_id
        );

        Ok(adjustments)
    }

    /// List adjustments for a take
    pub async fn list_adjustments(&self, take_id: Uuid) -> AppResult<Vec<StockAdjustment>> {
        self.fetch_take(take_id).await?;

        let adjustments = sqlx::query_as::<_, StockAdjustment>(&format!(
            r#"
            SELECT {ADJUSTMENT_COLUMNS}
            FROM stock_adjustments
            WHERE stock_take_id = $1
            ORDER BY item_name
            "#
        ))
        .bind(take_id)
        .fetch_all(&self.db)
        .await?;

        Ok(adjustments)
    }

    /// Approve one pending adjustment and apply it to stock.
    ///
    /// The status flip is the idempotency gate: the `UPDATE ... WHERE
    /// status = 'pending'` claims the adjustment, so a concurrent or repeat
    /// approval finds nothing to claim and the movement never double-applies.
    pub async fn approve_adjustment(
        &self,
        adjustment_id: Uuid,
        actor: Uuid,
    ) -> AppResult<StockAdjustment> {
        let mut tx = self.db.begin().await?;

        let claimed = sqlx::query_as::<_, StockAdjustment>(&format!(
            r#"
            UPDATE stock_adjustments
            SET status = $1, approved_by = $2, approved_at = NOW()
            WHERE id = $3 AND status = $4
            RETURNING {ADJUSTMENT_COLUMNS}
            "#
        ))
        .bind(AdjustmentStatus::Approved.as_str())
        .bind(actor)
        .bind(adjustment_id)
        .bind(AdjustmentStatus::Pending.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(adjustment) = claimed else {
            tx.rollback().await?;
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM stock_adjustments WHERE id = $1)",
            )
            .bind(adjustment_id)
            .fetch_one(&self.db)
            .await?;
            return Err(if exists {
                AppError::InvalidStateTransition("Adjustment is already approved".to_string())
            } else {
                AppError::NotFound("Stock adjustment".to_string())
            });
        };

        let item = lock_item(&mut tx, adjustment.item_id).await?;
        let change = next_quantity(
            item.available_quantity,
            StockEffect::SetTo(adjustment.quantity_after),
            false,
        )
        .map_err(|_| {
            AppError::ValidationError("Adjustment target cannot be negative".to_string())
        })?;

        sqlx::query(
            "UPDATE inventory_items SET available_quantity = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(change.new_available)
        .bind(adjustment.item_id)
        .execute(&mut *tx)
        .await?;

        insert_movement(
            &mut tx,
            NewMovement {
                item_id: adjustment.item_id,
                kind: MovementKind::Adjustment,
                quantity: change.delta.abs(),
                quantity_delta: change.delta,
                unit_cost: adjustment.unit_cost,
                reference_type: Some("stock_take_adjustment"),
                reference_id: Some(adjustment.id),
                transfer_group_id: None,
                notes: None,
                created_by: actor,
            },
        )
        .await?;

        // Stamp the take once its last pending adjustment is approved
        sqlx::query(
            r#"
            UPDATE stock_takes
            SET approved_by = $1, approved_at = NOW(), updated_at = NOW()
            WHERE id = $2
              AND approved_by IS NULL
              AND NOT EXISTS (
                  SELECT 1 FROM stock_adjustments
                  WHERE stock_take_id = $2 AND status = $3
              )
            "#,
        )
        .bind(actor)
        .bind(adjustment.stock_take_id)
        .bind(AdjustmentStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Approved adjustment {} for {}: {} -> {}",
            adjustment.id,
            adjustment.item_name,
            adjustment.quantity_before,
            adjustment.quantity_after
        );

        Ok(adjustment)
    }

    /// Read-only variance aggregation over a take's lines
    pub async fn variance_report(&self, take_id: Uuid) -> AppResult<VarianceReport> {
        let detail = self.get(take_id).await?;

        let lines: Vec<VarianceLine> = detail
            .items
            .iter()
            .map(|line| VarianceLine {
                item_name: line.item_name.clone(),
                system_quantity: line.system_quantity,
                physical_quantity: line.physical_quantity,
                variance_quantity: line.variance_quantity,
                variance_value: line.variance_value,
            })
            .collect();

        Ok(VarianceReport {
            stock_take_id: detail.take.id,
            title: detail.take.title,
            status: detail.take.status,
            summary: summarize_variances(&lines),
            lines,
        })
    }

    async fn fetch_take(&self, take_id: Uuid) -> AppResult<StockTake> {
        sqlx::query_as::<_, StockTake>(&format!(
            "SELECT {TAKE_COLUMNS} FROM stock_takes WHERE id = $1"
        ))
        .bind(take_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock take".to_string()))
    }
}

async fn lock_take_status(
    tx: &mut Transaction<'_, Postgres>,
    take_id: Uuid,
) -> AppResult<String> {
    sqlx::query_scalar::<_, String>("SELECT status FROM stock_takes WHERE id = $1 FOR UPDATE")
        .bind(take_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock take".to_string()))
}

fn parse_status(status: &str) -> AppResult<StockTakeStatus> {
    StockTakeStatus::from_str(status)
        .ok_or_else(|| AppError::Internal(format!("Unknown stock take status: {}", status)))
}

fn require_transition(current: String, next: StockTakeStatus) -> AppResult<()> {
    let current_status = parse_status(&current)?;
    if !current_status.can_transition_to(next) {
        return Err(AppError::InvalidStateTransition(format!(
            "Cannot move a stock take from {} to {}",
            current,
            next.as_str()
        )));
    }
    Ok(())
}
