//! HTTP handlers for the current user and role assignment

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::resolve_actor;
use crate::middleware::CurrentUser;
use crate::models::UserRole;
use crate::services::identity::{
    CurrentUserProfile, IdentityService, InitializeRoleInput, UpdateUserRoleInput,
};
use crate::AppState;

/// Current user with role and permissions
pub async fn get_current_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<CurrentUserProfile>> {
    let service = IdentityService::new(state.db);
    Ok(Json(service.get_current_user(current_user.0.user_id).await?))
}

/// Role of a user. Users may read their own; others need a resolved role.
pub async fn get_user_role(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserRole>> {
    if user_id != current_user.0.user_id {
        resolve_actor(&state, &current_user.0).await?;
    }
    let service = IdentityService::new(state.db);
    service
        .get_user_role(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User role".to_string()))
}

/// Assign the caller's first role
pub async fn initialize_user_role(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<InitializeRoleInput>,
) -> AppResult<Json<UserRole>> {
    let service = IdentityService::new(state.db);
    Ok(Json(
        service
            .initialize_user_role(current_user.0.user_id, input)
            .await?,
    ))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(input): Json<UpdateUserRoleInput>,
) -> AppResult<Json<UserRole>> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = IdentityService::new(state.db);
    Ok(Json(service.update_user_role(&actor, user_id, input).await?))
}
