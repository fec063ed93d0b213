//! Consumption and replenishment façade
//!
//! Front door for sales-driven stock changes. A composite product order is
//! expanded through the recipe resolver and deducted line by line; a product
//! without a recipe falls back to a single atomic deduction of the matched
//! catalog item. Replenishment is a thin wrapper over an inbound movement.
//!
//! Per-line deduction deliberately tolerates partial failure: a sale that
//! exhausts one topping still deducts the rest, and the caller sees exactly
//! which lines landed where. The `all_or_nothing` flag switches to a single
//! transaction that applies every deduction or none.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use shared::{
    find_match, next_quantity, validate_positive_quantity, AvailabilityReport, LedgerViolation,
    MovementKind, RecipeBook, StockEffect,
};

use crate::error::{AppError, AppResult};
use crate::services::ledger::{insert_movement, lock_item, ApplyMovementInput, LedgerService, Movement, NewMovement};
use crate::services::recipe::RecipeService;

/// Consumption service: recipe-driven deductions and replenishment
#[derive(Clone)]
pub struct ConsumptionService {
    db: PgPool,
    recipes: Arc<RecipeBook>,
}

/// Input for replenishing one item
#[derive(Debug, Deserialize)]
pub struct ReplenishInput {
    pub item_id: Uuid,
    pub quantity: Decimal,
    /// Acquisition cost per unit; defaults to the item's current cost
    pub unit_cost: Option<Decimal>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Input for consuming a product (composite or atomic)
#[derive(Debug, Deserialize)]
pub struct ConsumeInput {
    pub product: String,
    pub units: Decimal,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    /// When set, every deduction applies in one transaction or none do
    #[serde(default)]
    pub all_or_nothing: bool,
}

/// One recipe line successfully deducted
#[derive(Debug, Clone, Serialize)]
pub struct DeductedLine {
    pub ingredient: String,
    pub item_id: Uuid,
    pub item_name: String,
    /// Deducted quantity, in the item's unit
    pub quantity: Decimal,
    pub movement_id: Uuid,
    /// No conversion path existed; the raw recipe quantity was deducted
    pub conversion_warning: bool,
}

/// One recipe line that could not be deducted for stock reasons
#[derive(Debug, Clone, Serialize)]
pub struct MissingLine {
    pub ingredient: String,
    pub item_name: Option<String>,
    pub quantity: Decimal,
    pub reason: String,
}

/// Outcome of a consumption request
#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionOutcome {
    pub product: String,
    pub units: Decimal,
    pub deducted: Vec<DeductedLine>,
    pub missing: Vec<MissingLine>,
    /// Non-stock failures (bad lines, vanished items)
    pub errors: Vec<String>,
}

impl ConsumptionOutcome {
    pub fn fully_applied(&self) -> bool {
        self.missing.is_empty() && self.errors.is_empty()
    }
}

impl ConsumptionService {
    /// Create a new ConsumptionService instance
    pub fn new(db: PgPool, recipes: Arc<RecipeBook>) -> Self {
        Self { db, recipes }
    }

    fn ledger(&self) -> LedgerService {
        LedgerService::new(self.db.clone())
    }

    fn recipe_service(&self) -> RecipeService {
        RecipeService::new(self.db.clone(), Arc::clone(&self.recipes))
    }

    /// Replenish one item (inbound movement)
    pub async fn replenish(&self, actor: Uuid, input: ReplenishInput) -> AppResult<Movement> {
        validate_positive_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;

        let movements = self
            .ledger()
            .apply_movement(
                actor,
                ApplyMovementInput {
                    item_id: input.item_id,
                    kind: MovementKind::In,
                    quantity: Some(input.quantity),
                    target_quantity: None,
                    destination_item_id: None,
                    unit_cost: input.unit_cost,
                    reference_type: input.reference_type.or_else(|| Some("replenishment".to_string())),
                    reference_id: input.reference_id,
                    notes: input.notes,
                    allow_negative: false,
                },
            )
            .await?;

        // Inbound movements always produce exactly one row
        movements
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Replenishment produced no movement".to_string()))
    }

    /// Consume a product for a sale.
    ///
    /// Composite products expand through their recipe; products without a
    /// recipe deduct a single matched catalog item atomically.
    pub async fn consume(&self, actor: Uuid, input: ConsumeInput) -> AppResult<ConsumptionOutcome> {
        if input.units <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "units".to_string(),
                message: "Units ordered must be positive".to_string(),
            });
        }

        if self.recipes.get(&input.product).is_none() {
            return self.consume_atomic(actor, input).await;
        }

        if input.all_or_nothing {
            self.consume_all_or_nothing(actor, input).await
        } else {
            self.consume_per_line(actor, input).await
        }
    }

    /// Advisory availability check (no locks, no writes)
    pub async fn check_availability(
        &self,
        product: &str,
        units: Decimal,
    ) -> AppResult<AvailabilityReport> {
        if self.recipes.get(product).is_some() {
            return self.recipe_service().check_availability(product, units).await;
        }

        // Atomic product: the check reduces to one stock comparison
        let catalog = self.recipe_service().catalog_snapshot().await?;
        match find_match(&catalog, product, None) {
            Some(found) if found.candidate.available_quantity >= units => Ok(AvailabilityReport {
                available: true,
                reasons: vec![],
            }),
            Some(found) => Ok(AvailabilityReport {
                available: false,
                reasons: vec![format!(
                    "{}: insufficient stock of \"{}\" (available {}, required {})",
                    product, found.candidate.name, found.candidate.available_quantity, units
                )],
            }),
            None => Ok(AvailabilityReport {
                available: false,
                reasons: vec![format!("{}: no active catalog item matches", product)],
            }),
        }
    }

    /// Default policy: one ledger call per resolved line, each in its own
    /// transaction. Failed lines are reported, not rolled back.
    async fn consume_per_line(
        &self,
        actor: Uuid,
        input: ConsumeInput,
    ) -> AppResult<ConsumptionOutcome> {
        let resolution = self.recipe_service().resolve(&input.product, input.units).await?;

        let mut outcome = ConsumptionOutcome {
            product: input.product.clone(),
            units: input.units,
            deducted: vec![],
            missing: vec![],
            errors: vec![],
        };

        for line in &resolution.unresolved {
            outcome.missing.push(MissingLine {
                ingredient: line.ingredient.clone(),
                item_name: None,
                quantity: line.quantity,
                reason: line.reason.clone(),
            });
        }

        let ledger = self.ledger();
        for line in &resolution.resolved {
            let applied = ledger
                .apply_movement(
                    actor,
                    ApplyMovementInput {
                        item_id: line.item_id,
                        kind: MovementKind::Sale,
                        quantity: Some(line.quantity),
                        target_quantity: None,
                        destination_item_id: None,
                        unit_cost: None,
                        reference_type: Some("sale".to_string()),
                        reference_id: input.reference_id,
                        notes: Some(format!("{} x {}", input.units, input.product)),
                        allow_negative: false,
                    },
                )
                .await;

            match applied {
                Ok(movements) => {
                    if let Some(movement) = movements.into_iter().next() {
                        outcome.deducted.push(DeductedLine {
                            ingredient: line.ingredient.clone(),
                            item_id: line.item_id,
                            item_name: line.item_name.clone(),
                            quantity: line.quantity,
                            movement_id: movement.id,
                            conversion_warning: line.conversion_warning,
                        });
                    }
                }
                Err(AppError::InsufficientStock(reason)) => outcome.missing.push(MissingLine {
                    ingredient: line.ingredient.clone(),
                    item_name: Some(line.item_name.clone()),
                    quantity: line.quantity,
                    reason,
                }),
                Err(AppError::NotFound(_)) => outcome.errors.push(format!(
                    "{}: item \"{}\" is no longer active",
                    line.ingredient, line.item_name
                )),
                Err(AppError::Validation { message, .. }) => outcome
                    .errors
                    .push(format!("{}: {}", line.ingredient, message)),
                Err(other) => return Err(other),
            }
        }

        if !outcome.fully_applied() {
            tracing::warn!(
                "Partial consumption of {} x {}: {} deducted, {} missing, {} errors",
                input.units,
                input.product,
                outcome.deducted.len(),
                outcome.missing.len(),
                outcome.errors.len()
            );
        }

        Ok(outcome)
    }

    /// Strict policy: lock every resolved item in one transaction, verify
    /// every sufficiency, then apply all deductions or none.
    async fn consume_all_or_nothing(
        &self,
        actor: Uuid,
        input: ConsumeInput,
    ) -> AppResult<ConsumptionOutcome> {
        let resolution = self.recipe_service().resolve(&input.product, input.units).await?;

        let mut outcome = ConsumptionOutcome {
            product: input.product.clone(),
            units: input.units,
            deducted: vec![],
            missing: vec![],
            errors: vec![],
        };

        for line in &resolution.unresolved {
            outcome.missing.push(MissingLine {
                ingredient: line.ingredient.clone(),
                item_name: None,
                quantity: line.quantity,
                reason: line.reason.clone(),
            });
        }

        // An unresolvable line already sinks the whole order
        if !outcome.missing.is_empty() {
            return Ok(outcome);
        }

        let mut lines: Vec<_> = resolution.resolved.iter().collect();
        // Stable lock order across concurrent orders
        lines.sort_by_key(|l| l.item_id);

        let mut tx = self.db.begin().await?;
        let mut planned = Vec::with_capacity(lines.len());

        for line in &lines {
            let item = lock_item(&mut tx, line.item_id).await?;
            match next_quantity(
                item.available_quantity,
                StockEffect::Deplete(line.quantity),
                false,
            ) {
                Ok(change) => planned.push((line, item, change)),
                Err(LedgerViolation::InsufficientStock { available, .. }) => {
                    outcome.missing.push(MissingLine {
                        ingredient: line.ingredient.clone(),
                        item_name: Some(line.item_name.clone()),
                        quantity: line.quantity,
                        reason: format!(
                            "\"{}\": available {}, requested {}",
                            item.name, available, line.quantity
                        ),
                    });
                }
                Err(LedgerViolation::NonPositiveQuantity | LedgerViolation::NegativeTarget) => {
                    outcome
                        .errors
                        .push(format!("{}: invalid deduction quantity", line.ingredient));
                }
            }
        }

        if !outcome.fully_applied() {
            tx.rollback().await?;
            return Ok(outcome);
        }

        for (line, item, change) in &planned {
            sqlx::query(
                "UPDATE inventory_items SET available_quantity = $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(change.new_available)
            .bind(line.item_id)
            .execute(&mut *tx)
            .await?;

            let movement = insert_movement(
                &mut tx,
                NewMovement {
                    item_id: line.item_id,
                    kind: MovementKind::Sale,
                    quantity: line.quantity,
                    quantity_delta: change.delta,
                    unit_cost: item.cost_per_unit,
                    reference_type: Some("sale"),
                    reference_id: input.reference_id,
                    transfer_group_id: None,
                    notes: Some(&format!("{} x {}", input.units, input.product)),
                    created_by: actor,
                },
            )
            .await?;

            outcome.deducted.push(DeductedLine {
                ingredient: line.ingredient.clone(),
                item_id: line.item_id,
                item_name: line.item_name.clone(),
                quantity: line.quantity,
                movement_id: movement.id,
                conversion_warning: line.conversion_warning,
            });
        }

        tx.commit().await?;
        Ok(outcome)
    }

    /// A product with no recipe deducts as a single catalog item, matched
    /// with the same search the resolver uses (no category hint).
    async fn consume_atomic(&self, actor: Uuid, input: ConsumeInput) -> AppResult<ConsumptionOutcome> {
        let catalog = self.recipe_service().catalog_snapshot().await?;
        let found = find_match(&catalog, &input.product, None).ok_or_else(|| {
            AppError::NotFound(format!(
                "No recipe or catalog item matches \"{}\"",
                input.product
            ))
        })?;

        let item_id = found.candidate.id;
        let item_name = found.candidate.name.clone();

        let mut outcome = ConsumptionOutcome {
            product: input.product.clone(),
            units: input.units,
            deducted: vec![],
            missing: vec![],
            errors: vec![],
        };

        let applied = self
            .ledger()
            .apply_movement(
                actor,
                ApplyMovementInput {
                    item_id,
                    kind: MovementKind::Sale,
                    quantity: Some(input.units),
                    target_quantity: None,
                    destination_item_id: None,
                    unit_cost: None,
                    reference_type: Some("sale".to_string()),
                    reference_id: input.reference_id,
                    notes: input.notes,
                    allow_negative: false,
                },
            )
            .await;

        // Same outcome shape as the composite path: a stock shortfall is a
        // missing line, not a request failure
        match applied {
            Ok(movements) => {
                for m in movements {
                    outcome.deducted.push(DeductedLine {
                        ingredient: input.product.clone(),
                        item_id,
                        item_name: item_name.clone(),
                        quantity: m.quantity,
                        movement_id: m.id,
                        conversion_warning: false,
                    });
                }
            }
            Err(AppError::InsufficientStock(reason)) => outcome.missing.push(MissingLine {
                ingredient: input.product.clone(),
                item_name: Some(item_name),
                quantity: input.units,
                reason,
            }),
            Err(AppError::NotFound(_)) => outcome.errors.push(format!(
                "{}: item \"{}\" is no longer active",
                input.product, item_name
            )),
            Err(other) => return Err(other),
        }

        if !outcome.fully_applied() {
            tracing::warn!(
                "Atomic consumption of {} x {} not applied: {} missing, {} errors",
                input.units,
                input.product,
                outcome.missing.len(),
                outcome.errors.len()
            );
        }

        Ok(outcome)
    }
}
