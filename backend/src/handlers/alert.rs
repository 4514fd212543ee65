//! HTTP handlers for alerts

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::resolve_actor;
use crate::middleware::CurrentUser;
use crate::models::{Alert, AlertWithSupply, Permission};
use crate::services::alert::{AlertFilter, AlertService, SweepResult};
use crate::AppState;

pub async fn list_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<AlertFilter>,
) -> AppResult<Json<Vec<AlertWithSupply>>> {
    resolve_actor(&state, &current_user.0).await?;
    let service = AlertService::new(state.db);
    Ok(Json(service.list_alerts(filter).await?))
}

pub async fn mark_alert_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(alert_id): Path<Uuid>,
) -> AppResult<Json<Alert>> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = AlertService::new(state.db);
    Ok(Json(service.mark_alert_read(&actor, alert_id).await?))
}

pub async fn resolve_alert(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(alert_id): Path<Uuid>,
) -> AppResult<Json<Alert>> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = AlertService::new(state.db);
    Ok(Json(service.resolve_alert(&actor, alert_id).await?))
}

/// Run the low-stock and expiration sweeps now
pub async fn run_alert_sweep(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<SweepResult>> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    actor.require(Permission::CreateAlerts)?;

    let service = AlertService::new(state.db);
    let result = service
        .run_sweeps(state.config.alerts.expiration_window_days)
        .await?;
    Ok(Json(result))
}
