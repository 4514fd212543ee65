use axum::{
    extract::{Query, State},
    Json,
};
use shared::Pagination;

use crate::error::AppResult;
use crate::handlers::resolve_actor;
use crate::middleware::CurrentUser;
use crate::models::AuditLog;
use crate::services::audit::AuditService;
use crate::AppState;

/// Most recent audit entries
pub async fn list_audit_logs(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<AuditLog>>> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = AuditService::new(state.db);
    Ok(Json(service.list_audit_logs(&actor, page.limit).await?))
}
