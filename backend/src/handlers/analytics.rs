//! HTTP handlers for analytics endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::{AnalyticsPeriod, InventoryAnalytics, UsageTrendPoint};

use crate::error::AppResult;
use crate::handlers::resolve_actor;
use crate::middleware::CurrentUser;
use crate::services::analytics::{AnalyticsService, UsageTrendQuery};
use crate::services::reporting::ReportingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub period: AnalyticsPeriod,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>, // "json" or "csv"
}

pub async fn get_inventory_analytics(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<InventoryAnalytics>> {
    resolve_actor(&state, &current_user.0).await?;
    let service = AnalyticsService::new(state.db);
    Ok(Json(service.inventory_analytics(query.period).await?))
}

/// Reorder suggestions, most urgent first
pub async fn get_reorder_suggestions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    resolve_actor(&state, &current_user.0).await?;
    let service = AnalyticsService::new(state.db);
    let data = service.reorder_suggestions().await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&data)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"reorder_suggestions.csv\"",
                ),
            ],
            csv,
        ).into_response())
    } else {
        Ok(Json(data).into_response())
    }
}

pub async fn get_usage_trends(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<UsageTrendQuery>,
) -> AppResult<Json<Vec<UsageTrendPoint>>> {
    resolve_actor(&state, &current_user.0).await?;
    let service = AnalyticsService::new(state.db);
    Ok(Json(service.usage_trends(query).await?))
}
