//! HTTP handler for loading the demo catalog

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::handlers::resolve_actor;
use crate::middleware::CurrentUser;
use crate::services::seed::{SampleDataReport, SeedService};
use crate::AppState;

/// Seed an empty database. Returns 201 when data was written, 200 when it already existed.
pub async fn initialize_sample_data(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<(StatusCode, Json<SampleDataReport>)> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let report = SeedService::new(state.db)
        .initialize_sample_data(&actor)
        .await?;
    let status = if report.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(report)))
}
