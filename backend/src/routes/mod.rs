//! Route definitions for the Dessert Shop Operations Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - catalog management
        .nest("/items", item_routes())
        // Protected routes - movement ledger
        .nest("/inventory", inventory_routes())
        // Protected routes - recipes
        .nest("/recipes", recipe_routes())
        // Protected routes - consumption and replenishment
        .nest("/consumption", consumption_routes())
        // Protected routes - stock takes
        .nest("/stock-takes", stock_take_routes())
}

/// Catalog management routes (protected)
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/low-stock", get(handlers::low_stock_items))
        .route(
            "/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::archive_item),
        )
        .route("/:item_id/movements", get(handlers::list_movements))
        .route("/:item_id/balance", get(handlers::get_balance))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Movement ledger routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/movements", post(handlers::apply_movement))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Recipe routes (protected)
fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_recipes))
        .route("/:product/resolve", get(handlers::resolve_recipe))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Consumption and replenishment routes (protected)
fn consumption_routes() -> Router<AppState> {
    Router::new()
        .route("/replenish", post(handlers::replenish))
        .route("/consume", post(handlers::consume))
        .route("/check", post(handlers::check_availability))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock-take routes (protected)
fn stock_take_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_stock_takes).post(handlers::create_stock_take),
        )
        .route("/:take_id", get(handlers::get_stock_take))
        .route("/:take_id/start", post(handlers::start_stock_take))
        .route("/:take_id/complete", post(handlers::complete_stock_take))
        .route(
            "/:take_id/adjustments",
            get(handlers::list_adjustments).post(handlers::generate_adjustments),
        )
        .route("/:take_id/report", get(handlers::variance_report))
        .route("/items/:line_id/count", post(handlers::record_count))
        .route("/adjustments/:adjustment_id/approve", post(handlers::approve_adjustment))
        .route_layer(middleware::from_fn(auth_middleware))
}
