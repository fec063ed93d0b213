//! HTTP handlers for consumption and replenishment endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use shared::{AvailabilityReport, RecipeResolution};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::consumption::{
    ConsumeInput, ConsumptionOutcome, ConsumptionService, ReplenishInput,
};
use crate::services::ledger::Movement;
use crate::services::recipe::RecipeService;
use crate::AppState;

/// Replenish one item (inbound stock)
pub async fn replenish(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReplenishInput>,
) -> AppResult<Json<Movement>> {
    let service = ConsumptionService::new(state.db, Arc::clone(&state.recipes));
    let movement = service.replenish(current_user.0.user_id, input).await?;
    Ok(Json(movement))
}

/// Consume a product for a sale
pub async fn consume(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ConsumeInput>,
) -> AppResult<Json<ConsumptionOutcome>> {
    let service = ConsumptionService::new(state.db, Arc::clone(&state.recipes));
    let outcome = service.consume(current_user.0.user_id, input).await?;
    Ok(Json(outcome))
}

/// Request body for an availability check
#[derive(Debug, Deserialize)]
pub struct CheckAvailabilityInput {
    pub product: String,
    pub units: Decimal,
}

/// Advisory availability check for a product order
pub async fn check_availability(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CheckAvailabilityInput>,
) -> AppResult<Json<AvailabilityReport>> {
    let service = ConsumptionService::new(state.db, Arc::clone(&state.recipes));
    let report = service.check_availability(&input.product, input.units).await?;
    Ok(Json(report))
}

/// Composite product names known to the recipe book
pub async fn list_recipes(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<String>>> {
    let service = RecipeService::new(state.db, Arc::clone(&state.recipes));
    Ok(Json(service.product_names()))
}

/// Query for expanding a recipe
#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    /// Units of the composite product (default 1)
    pub units: Option<Decimal>,
}

/// Expand one recipe against current stock without deducting
pub async fn resolve_recipe(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product): Path<String>,
    Query(query): Query<ResolveQuery>,
) -> AppResult<Json<RecipeResolution>> {
    let service = RecipeService::new(state.db, Arc::clone(&state.recipes));
    let units = query.units.unwrap_or(Decimal::ONE);
    let resolution = service.resolve(&product, units).await?;
    Ok(Json(resolution))
}
