//! HTTP handlers for supplier endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::resolve_actor;
use crate::middleware::CurrentUser;
use crate::models::{Supplier, SupplierWithCount};
use crate::services::supplier::{CreateSupplierInput, SupplierService, UpdateSupplierInput};
use crate::AppState;

/// List active suppliers
pub async fn list_suppliers(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<SupplierWithCount>>> {
    resolve_actor(&state, &current_user.0).await?;
    let service = SupplierService::new(state.db);
    Ok(Json(service.list_suppliers().await?))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<Supplier>> {
    resolve_actor(&state, &current_user.0).await?;
    let service = SupplierService::new(state.db);
    Ok(Json(service.get_supplier(supplier_id).await?))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSupplierInput>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = SupplierService::new(state.db);
    let supplier = service.create_supplier(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<UpdateSupplierInput>,
) -> AppResult<Json<Supplier>> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = SupplierService::new(state.db);
    Ok(Json(service.update_supplier(&actor, supplier_id, input).await?))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = SupplierService::new(state.db);
    service.delete_supplier(&actor, supplier_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
