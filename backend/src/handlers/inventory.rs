//! HTTP handlers for the movement ledger endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::ledger::{ApplyMovementInput, BalanceAudit, LedgerService, Movement};
use crate::AppState;

/// Apply a stock movement (any kind, including transfers)
pub async fn apply_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ApplyMovementInput>,
) -> AppResult<Json<Vec<Movement>>> {
    let service = LedgerService::new(state.db);
    let movements = service.apply_movement(current_user.0.user_id, input).await?;
    Ok(Json(movements))
}

/// Movement history for one item
pub async fn list_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Vec<Movement>>> {
    let service = LedgerService::new(state.db);
    let movements = service.list_movements(item_id).await?;
    Ok(Json(movements))
}

/// Stored quantity audited against the ledger sum
pub async fn get_balance(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<BalanceAudit>> {
    let service = LedgerService::new(state.db);
    let balance = service.get_balance(item_id).await?;
    Ok(Json(balance))
}
