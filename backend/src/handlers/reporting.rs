//! Reporting handlers for the dashboard and data export

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::error::AppResult;
use crate::handlers::resolve_actor;
use crate::middleware::CurrentUser;
use crate::services::reporting::{DashboardStats, ExpiringQuery, ReportingService};
use crate::AppState;

/// Get dashboard metrics
pub async fn get_dashboard_stats(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<DashboardStats>> {
    resolve_actor(&state, &current_user.0).await?;
    let service = ReportingService::new(state.db);
    Ok(Json(service.dashboard_stats().await?))
}

/// Get batches expiring within the window
pub async fn get_expiring_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<impl IntoResponse> {
    resolve_actor(&state, &current_user.0).await?;
    let service = ReportingService::new(state.db);
    let data = service.expiring_items(query.days_ahead).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&data)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"expiring_items.csv\"",
                ),
            ],
            csv,
        ).into_response())
    } else {
        Ok(Json(data).into_response())
    }
}
