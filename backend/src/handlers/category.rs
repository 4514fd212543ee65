//! HTTP handlers for category endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::resolve_actor;
use crate::middleware::CurrentUser;
use crate::models::{Category, CategoryWithCount};
use crate::services::category::{CategoryService, CreateCategoryInput, UpdateCategoryInput};
use crate::AppState;

/// List categories with supply counts
pub async fn list_categories(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<CategoryWithCount>>> {
    resolve_actor(&state, &current_user.0).await?;
    let service = CategoryService::new(state.db);
    Ok(Json(service.list_categories().await?))
}

pub async fn get_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<Category>> {
    resolve_actor(&state, &current_user.0).await?;
    let service = CategoryService::new(state.db);
    Ok(Json(service.get_category(category_id).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = CategoryService::new(state.db);
    let category = service.create_category(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
    Json(input): Json<UpdateCategoryInput>,
) -> AppResult<Json<Category>> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = CategoryService::new(state.db);
    Ok(Json(service.update_category(&actor, category_id, input).await?))
}

/// Delete a category that no supply references
pub async fn delete_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = CategoryService::new(state.db);
    service.delete_category(&actor, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
