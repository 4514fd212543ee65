//! HTTP handlers for stock movements, batches and barcode scans

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::resolve_actor;
use crate::middleware::CurrentUser;
use crate::models::{InventoryBatch, MovementWithNames};
use crate::services::inventory::{
    AddBatchInput, AddBatchOutcome, InventoryService, MovementOutcome, QuarantineInput,
    RecordMovementInput, ScanBarcodeInput, ScanResult,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    pub supply_id: Option<Uuid>,
    #[serde(default = "default_movement_limit")]
    pub limit: i64,
}

fn default_movement_limit() -> i64 {
    50
}

/// Record a stock movement
pub async fn record_stock_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordMovementInput>,
) -> AppResult<(StatusCode, Json<MovementOutcome>)> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = InventoryService::new(state.db);
    let outcome = service.record_stock_movement(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// List movements, newest first
pub async fn list_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<Vec<MovementWithNames>>> {
    resolve_actor(&state, &current_user.0).await?;
    let service = InventoryService::new(state.db);
    Ok(Json(service.list_movements(query.supply_id, query.limit).await?))
}

/// Look up, receive or dispense by barcode
pub async fn scan_barcode(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ScanBarcodeInput>,
) -> AppResult<Json<ScanResult>> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = InventoryService::new(state.db);
    Ok(Json(service.scan_barcode(&actor, input).await?))
}

/// Receive a new batch
pub async fn add_inventory_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AddBatchInput>,
) -> AppResult<(StatusCode, Json<AddBatchOutcome>)> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = InventoryService::new(state.db);
    let outcome = service.add_inventory_batch(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn set_batch_quarantine(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<QuarantineInput>,
) -> AppResult<Json<InventoryBatch>> {
    let actor = resolve_actor(&state, &current_user.0).await?;
    let service = InventoryService::new(state.db);
    Ok(Json(service.set_batch_quarantine(&actor, batch_id, input).await?))
}
