//! Route definitions for the Medical Supply Inventory Platform

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes. Everything under `/api/v1` except health requires a bearer token.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .merge(protected_routes().route_layer(middleware::from_fn_with_state(
            state,
            auth_middleware,
        )))
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .nest("/me", identity_routes())
        .nest("/users", user_routes())
        .nest("/categories", category_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/supplies", supply_routes())
        .nest("/inventory", inventory_routes())
        .nest("/alerts", alert_routes())
        .nest("/analytics", analytics_routes())
        .nest("/reports", report_routes())
        .route("/audit-logs", get(handlers::list_audit_logs))
        .route("/admin/sample-data", post(handlers::initialize_sample_data))
}

/// Current user routes
fn identity_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_current_user))
        .route("/role", post(handlers::initialize_user_role))
}

/// Role management routes
fn user_routes() -> Router<AppState> {
    Router::new().route(
        "/:user_id/role",
        get(handlers::get_user_role).put(handlers::update_user_role),
    )
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_categories).post(handlers::create_category))
        .route(
            "/:category_id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
}

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_suppliers).post(handlers::create_supplier))
        .route(
            "/:supplier_id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
}

fn supply_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_supplies).post(handlers::create_supply))
        .route(
            "/:supply_id",
            get(handlers::get_supply_details)
                .put(handlers::update_supply)
                .delete(handlers::deactivate_supply),
        )
        .route("/:supply_id/batches", get(handlers::list_supply_batches))
}

/// Stock movement, batch and barcode routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/movements",
            get(handlers::list_movements).post(handlers::record_stock_movement),
        )
        .route("/batches", post(handlers::add_inventory_batch))
        .route(
            "/batches/:batch_id/quarantine",
            put(handlers::set_batch_quarantine),
        )
        .route("/scan", post(handlers::scan_barcode))
}

fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_alerts))
        .route("/sweep", post(handlers::run_alert_sweep))
        .route("/:alert_id/read", patch(handlers::mark_alert_read))
        .route("/:alert_id/resolve", patch(handlers::resolve_alert))
}

fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(handlers::get_inventory_analytics))
        .route("/reorder-suggestions", get(handlers::get_reorder_suggestions))
        .route("/usage-trends", get(handlers::get_usage_trends))
}

/// Reporting routes (JSON or `?format=csv`)
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard_stats))
        .route("/expiring", get(handlers::get_expiring_items))
}
