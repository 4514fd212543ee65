//! HTTP handlers for the supply catalog

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::resolve_actor;
use crate::middleware::CurrentUser;
use crate::models::{InventoryBatch, Supply};
use crate::services::inventory::InventoryService;
use crate::services::supply::{
    CreateSupplyInput, SupplyDetails, SupplyFilter, SupplyListItem, SupplyService,
    UpdateSupplyInput,
};
use crate::AppState;

/// List active supplies with stock status
pub async fn list_supplies(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<SupplyFilter>,
) -> AppResult<Json<Vec<SupplyListItem>>> {
    resolve_actor(&state, &current_user.0).await?;
    let service = SupplyService::new(state.db);
    Ok(Json(service.list_supplies(filter).await?))
}

/// Supply with batches, recent movements and usage figures
pub async fn get_supply_details(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
) -> AppResult<Json<SupplyDetails>> {
    resolve_actor(&state, &current_user.0).await?;
    let service = SupplyService::new(state.db);
    Ok(Json(service.get_supply_details(supply_id).await?))
}

pub async fn create_supply(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSupplyInput>,
) -> AppResult<(StatusCode, Json<Supply>)> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = SupplyService::new(state.db);
    let supply = service.create_supply(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(supply)))
}

pub async fn update_supply(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
    Json(input): Json<UpdateSupplyInput>,
) -> AppResult<Json<Supply>> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = SupplyService::new(state.db);
    Ok(Json(service.update_supply(&actor, supply_id, input).await?))
}

/// Soft-delete a supply
pub async fn deactivate_supply(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
) -> AppResult<Json<Supply>> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = SupplyService::new(state.db);
    Ok(Json(service.deactivate_supply(&actor, supply_id).await?))
}

/// Batches of a supply, first expiry first
pub async fn list_supply_batches(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
) -> AppResult<Json<Vec<InventoryBatch>>> {
    resolve_actor(&state, &current_user.0).await?;
    let service = InventoryService::new(state.db);
    Ok(Json(service.list_batches(supply_id).await?))
}
