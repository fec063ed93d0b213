//! HTTP handlers for stock-take endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock_take::{
    CreateStockTakeInput, RecordCountInput, StockAdjustment, StockTake, StockTakeDetail,
    StockTakeItem, StockTakeService, VarianceReport,
};
use crate::AppState;

/// Create a stock take (draft)
pub async fn create_stock_take(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateStockTakeInput>,
) -> AppResult<Json<StockTake>> {
    let service = StockTakeService::new(state.db);
    let take = service.create(current_user.0.user_id, input).await?;
    Ok(Json(take))
}

/// List stock takes
pub async fn list_stock_takes(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<StockTake>>> {
    let service = StockTakeService::new(state.db);
    let takes = service.list().await?;
    Ok(Json(takes))
}

/// Get a stock take with its lines
pub async fn get_stock_take(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(take_id): Path<Uuid>,
) -> AppResult<Json<StockTakeDetail>> {
    let service = StockTakeService::new(state.db);
    let detail = service.get(take_id).await?;
    Ok(Json(detail))
}

/// Start a stock take (snapshots the active catalog)
pub async fn start_stock_take(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(take_id): Path<Uuid>,
) -> AppResult<Json<StockTakeDetail>> {
    let service = StockTakeService::new(state.db);
    let detail = service.start(take_id, current_user.0.user_id).await?;
    Ok(Json(detail))
}

/// Record a physical count on one line
pub async fn record_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(line_id): Path<Uuid>,
    Json(input): Json<RecordCountInput>,
) -> AppResult<Json<StockTakeItem>> {
    let service = StockTakeService::new(state.db);
    let line = service
        .record_count(line_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(line))
}

/// Complete a stock take
pub async fn complete_stock_take(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(take_id): Path<Uuid>,
) -> AppResult<Json<StockTake>> {
    let service = StockTakeService::new(state.db);
    let take = service.complete(take_id, current_user.0.user_id).await?;
    Ok(Json(take))
}

/// Generate pending adjustments from the counted variances
pub async fn generate_adjustments(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(take_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockAdjustment>>> {
    let service = StockTakeService::new(state.db);
    let adjustments = service
        .generate_adjustments(take_id, current_user.0.user_id)
        .await?;
    Ok(Json(adjustments))
}

/// List adjustments for a take
pub async fn list_adjustments(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(take_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockAdjustment>>> {
    let service = StockTakeService::new(state.db);
    let adjustments = service.list_adjustments(take_id).await?;
    Ok(Json(adjustments))
}

/// Approve one pending adjustment and apply it to stock
pub async fn approve_adjustment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(adjustment_id): Path<Uuid>,
) -> AppResult<Json<StockAdjustment>> {
    let service = StockTakeService::new(state.db);
    let adjustment = service
        .approve_adjustment(adjustment_id, current_user.0.user_id)
        .await?;
    Ok(Json(adjustment))
}

/// Variance report for a take
pub async fn variance_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(take_id): Path<Uuid>,
) -> AppResult<Json<VarianceReport>> {
    let service = StockTakeService::new(state.db);
    let report = service.variance_report(take_id).await?;
    Ok(Json(report))
}
