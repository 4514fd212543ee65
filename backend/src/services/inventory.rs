//! Inventory service for stock movements, batches and barcode operations
//!
//! Every stock change locks the supply row and its batches, computes the
//! ledger snapshot from the locked batches, patches the batches by exactly
//! the ledger delta and appends the movement in one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    compute_stock_change, current_stock, fefo_order, generate_receipt_batch_number,
    plan_batch_patch, plan_reorder_alert, receipt_expiration, validate_positive_quantity,
    BatchPatch, OpenAlertIndex, StockChange,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    AlertType, AuditAction, InventoryBatch, MovementType, MovementWithNames, Permission,
    ScanAction, StockMovement, Supply,
};
use crate::services::alert::insert_alert;
use crate::services::identity::Actor;
use crate::services::{audit, supply};

/// Number of batches returned by a barcode lookup
const LOOKUP_BATCH_LIMIT: usize = 5;

#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Input for recording a stock movement
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordMovementInput {
    pub supply_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i64,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    pub batch_id: Option<Uuid>,
}

/// Result of a recorded movement
#[derive(Debug, Clone, Serialize)]
pub struct MovementOutcome {
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub movement: StockMovement,
    /// Reorder alert raised by this movement, if any
    pub reorder_alert_id: Option<Uuid>,
}

/// Input for a barcode scan
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScanBarcodeInput {
    #[validate(length(min = 1, max = 64))]
    pub barcode: String,
    pub action: ScanAction,
    pub quantity: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub success: bool,
    pub action: ScanAction,
    pub supply: Supply,
    pub previous_stock: i64,
    pub new_stock: i64,
    /// Batches in FEFO order, populated for lookups
    pub batches: Vec<InventoryBatch>,
}

/// Input for receiving a new batch
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddBatchInput {
    pub supply_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub batch_number: String,
    pub quantity: i64,
    pub expiration_date: Option<DateTime<Utc>>,
    pub cost: Decimal,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddBatchOutcome {
    pub batch: InventoryBatch,
    pub movement: StockMovement,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuarantineInput {
    pub is_quarantined: bool,
}

/// A movement about to be written
struct MovementRequest<'a> {
    movement_type: MovementType,
    quantity: i64,
    reason: &'a str,
    location: &'a str,
    notes: Option<&'a str>,
    batch_id: Option<Uuid>,
    audit_action: AuditAction,
}

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a stock movement against a supply
    pub async fn record_stock_movement(
        &self,
        actor: &Actor,
        input: RecordMovementInput,
    ) -> AppResult<MovementOutcome> {
        actor.require(Permission::StockMovements)?;
        input.validate()?;
        validate_positive_quantity(input.quantity)?;

        let mut tx = self.db.begin().await?;

        let request = MovementRequest {
            movement_type: input.movement_type,
            quantity: input.quantity,
            reason: &input.reason,
            location: &input.location,
            notes: input.notes.as_deref(),
            batch_id: input.batch_id,
            audit_action: AuditAction::StockMovement,
        };
        let (_, outcome) =
            apply_movement(&mut tx, Some(actor.user_id()), input.supply_id, request).await?;

        tx.commit().await?;

        tracing::info!(
            "Recorded {} of {} for supply {}: {} -> {}",
            input.movement_type.as_str(),
            input.quantity,
            input.supply_id,
            outcome.previous_quantity,
            outcome.new_quantity
        );
        Ok(outcome)
    }

    /// Look up, receive or dispense a supply by barcode
    pub async fn scan_barcode(
        &self,
        actor: &Actor,
        input: ScanBarcodeInput,
    ) -> AppResult<ScanResult> {
        input.validate()?;

        let found = sqlx::query_as::<_, Supply>("SELECT * FROM supplies WHERE barcode = $1")
            .bind(&input.barcode)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Supply with this barcode".to_string()))?;

        let Some(movement_type) = input.action.movement_type() else {
            let mut batches = sqlx::query_as::<_, InventoryBatch>(
                "SELECT * FROM inventory_batches WHERE supply_id = $1",
            )
            .bind(found.id)
            .fetch_all(&self.db)
            .await?;
            let stock = current_stock(&batches);
            fefo_order(&mut batches);
            batches.truncate(LOOKUP_BATCH_LIMIT);

            return Ok(ScanResult {
                success: true,
                action: input.action,
                supply: found,
                previous_stock: stock,
                new_stock: stock,
                batches,
            });
        };

        actor.require(Permission::StockMovements)?;

        let quantity = input.quantity.ok_or_else(|| AppError::Validation {
            field: "quantity".to_string(),
            message: "Quantity is required for receive and dispense".to_string(),
        })?;
        let location = input.location.as_deref().ok_or_else(|| AppError::Validation {
            field: "location".to_string(),
            message: "Location is required for receive and dispense".to_string(),
        })?;
        validate_positive_quantity(quantity)?;

        let reason = format!("Barcode scan - {}", input.action.as_str());

        let mut tx = self.db.begin().await?;

        let request = MovementRequest {
            movement_type,
            quantity,
            reason: &reason,
            location,
            notes: None,
            batch_id: None,
            audit_action: AuditAction::BarcodeScan,
        };
        let (locked_supply, outcome) =
            apply_movement(&mut tx, Some(actor.user_id()), found.id, request).await?;

        tx.commit().await?;

        tracing::info!(
            "Barcode {} {}: {} -> {}",
            input.action.as_str(),
            input.barcode,
            outcome.previous_quantity,
            outcome.new_quantity
        );

        Ok(ScanResult {
            success: true,
            action: input.action,
            supply: locked_supply,
            previous_stock: outcome.previous_quantity,
            new_stock: outcome.new_quantity,
            batches: Vec::new(),
        })
    }

    /// Receive a named batch and record the matching `in` movement
    pub async fn add_inventory_batch(
        &self,
        actor: &Actor,
        input: AddBatchInput,
    ) -> AppResult<AddBatchOutcome> {
        actor.require(Permission::StockMovements)?;
        input.validate()?;
        validate_positive_quantity(input.quantity)?;
        if input.cost < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "cost".to_string(),
                message: "Cost must not be negative".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let (_, batches) = lock_supply_and_batches(&mut tx, input.supply_id).await?;
        let change =
            compute_stock_change(current_stock(&batches), MovementType::In, input.quantity)?;

        let batch = sqlx::query_as::<_, InventoryBatch>(
            r#"
            INSERT INTO inventory_batches (
                supply_id, batch_number, quantity, expiration_date, received_date,
                cost, location, is_quarantined, notes
            )
            VALUES ($1, $2, $3, $4, NOW(), $5, $6, false, $7)
            RETURNING *
            "#,
        )
        .bind(input.supply_id)
        .bind(&input.batch_number)
        .bind(input.quantity)
        .bind(input.expiration_date)
        .bind(input.cost)
        .bind(&input.location)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let movement = insert_movement(
            &mut tx,
            input.supply_id,
            Some(batch.id),
            MovementType::In,
            input.quantity,
            change,
            "Inventory received",
            Some(actor.user_id()),
            &input.location,
            input.notes.as_deref(),
        )
        .await?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::AddInventoryBatch,
            batch.id,
            None,
            Some(audit::snapshot(&batch)?),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Received batch {} ({} units) for supply {}",
            batch.batch_number,
            batch.quantity,
            batch.supply_id
        );
        Ok(AddBatchOutcome { batch, movement })
    }

    /// Batches of a supply in FEFO order
    pub async fn list_batches(&self, supply_id: Uuid) -> AppResult<Vec<InventoryBatch>> {
        supply::fetch_supply(&self.db, supply_id).await?;

        let mut batches = sqlx::query_as::<_, InventoryBatch>(
            "SELECT * FROM inventory_batches WHERE supply_id = $1",
        )
        .bind(supply_id)
        .fetch_all(&self.db)
        .await?;
        fefo_order(&mut batches);

        Ok(batches)
    }

    pub async fn set_batch_quarantine(
        &self,
        actor: &Actor,
        batch_id: Uuid,
        input: QuarantineInput,
    ) -> AppResult<InventoryBatch> {
        actor.require(Permission::StockMovements)?;

        let mut tx = self.db.begin().await?;

        let batch = sqlx::query_as::<_, InventoryBatch>(
            "UPDATE inventory_batches SET is_quarantined = $1 WHERE id = $2 RETURNING *",
        )
        .bind(input.is_quarantined)
        .bind(batch_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory batch".to_string()))?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::QuarantineBatch,
            batch.id,
            None,
            Some(serde_json::json!({ "is_quarantined": batch.is_quarantined })),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Batch {} quarantine set to {}",
            batch.batch_number,
            batch.is_quarantined
        );
        Ok(batch)
    }

    /// Ledger entries, newest first
    pub async fn list_movements(
        &self,
        supply_id: Option<Uuid>,
        limit: i64,
    ) -> AppResult<Vec<MovementWithNames>> {
        let movements = sqlx::query_as::<_, MovementWithNames>(
            r#"
            SELECT m.*, s.name AS supply_name, COALESCE(u.name, 'System') AS user_name
            FROM stock_movements m
            JOIN supplies s ON s.id = m.supply_id
            LEFT JOIN users u ON u.id = m.performed_by
            WHERE ($1::uuid IS NULL OR m.supply_id = $1)
            ORDER BY m.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(supply_id)
        .bind(limit.clamp(1, 200))
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }
}

/// Lock a supply and its batches for the rest of the transaction
async fn lock_supply_and_batches(
    conn: &mut PgConnection,
    supply_id: Uuid,
) -> AppResult<(Supply, Vec<InventoryBatch>)> {
    let supply = sqlx::query_as::<_, Supply>("SELECT * FROM supplies WHERE id = $1 FOR UPDATE")
        .bind(supply_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Supply".to_string()))?;

    let batches = sqlx::query_as::<_, InventoryBatch>(
        "SELECT * FROM inventory_batches WHERE supply_id = $1 FOR UPDATE",
    )
    .bind(supply_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok((supply, batches))
}

/// Apply a movement inside the caller's transaction
async fn apply_movement(
    conn: &mut PgConnection,
    performed_by: Option<Uuid>,
    supply_id: Uuid,
    request: MovementRequest<'_>,
) -> AppResult<(Supply, MovementOutcome)> {
    let (supply, batches) = lock_supply_and_batches(conn, supply_id).await?;

    let change = compute_stock_change(
        current_stock(&batches),
        request.movement_type,
        request.quantity,
    )?;

    let batch_id = patch_batches(conn, &supply, &batches, &request).await?;

    let movement = insert_movement(
        conn,
        supply.id,
        batch_id,
        request.movement_type,
        request.quantity,
        change,
        request.reason,
        performed_by,
        request.location,
        request.notes,
    )
    .await?;

    if request.movement_type.records_usage() {
        sqlx::query(
            r#"
            INSERT INTO usage_analytics (supply_id, date, quantity_used)
            VALUES ($1, $2, $3)
            ON CONFLICT (supply_id, date)
            DO UPDATE SET quantity_used = usage_analytics.quantity_used + EXCLUDED.quantity_used
            "#,
        )
        .bind(supply.id)
        .bind(movement.created_at.date_naive())
        .bind(request.quantity)
        .execute(&mut *conn)
        .await?;
    }

    let reorder_alert_id = raise_reorder_alert(conn, &supply, change.new_quantity).await?;

    audit::record(
        &mut *conn,
        performed_by,
        request.audit_action,
        movement.id,
        None,
        Some(serde_json::json!({
            "supply_id": supply.id,
            "movement_type": request.movement_type,
            "quantity": request.quantity,
            "previous_quantity": change.previous_quantity,
            "new_quantity": change.new_quantity,
        })),
    )
    .await?;

    let outcome = MovementOutcome {
        previous_quantity: change.previous_quantity,
        new_quantity: change.new_quantity,
        movement,
        reorder_alert_id,
    };
    Ok((supply, outcome))
}

/// Patch batch quantities by the movement delta. Returns the batch the
/// ledger entry should reference.
async fn patch_batches(
    conn: &mut PgConnection,
    supply: &Supply,
    batches: &[InventoryBatch],
    request: &MovementRequest<'_>,
) -> AppResult<Option<Uuid>> {
    let patch = plan_batch_patch(
        request.movement_type.effect(),
        request.batch_id,
        batches,
        request.quantity,
    )?;

    match &patch {
        BatchPatch::Set {
            batch_id,
            quantity_after,
            ..
        } => {
            set_batch_quantity(conn, *batch_id, *quantity_after).await?;
        }
        BatchPatch::Relocate { batch_id } => {
            sqlx::query("UPDATE inventory_batches SET location = $1 WHERE id = $2")
                .bind(request.location)
                .bind(batch_id)
                .execute(&mut *conn)
                .await?;
        }
        BatchPatch::Fefo(plan) => {
            if !plan.is_complete() {
                tracing::warn!(
                    "FEFO draw for supply {} left {} of {} units unallocated",
                    supply.id,
                    plan.unallocated,
                    request.quantity
                );
            }
            for draw in &plan.draws {
                set_batch_quantity(conn, draw.batch_id, draw.remaining()).await?;
            }
        }
        BatchPatch::Receive { quantity } => {
            let received_at = Utc::now();
            let id = Uuid::new_v4();
            let batch_id = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO inventory_batches (
                    id, supply_id, batch_number, quantity, expiration_date, received_date,
                    cost, location, is_quarantined
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, false)
                RETURNING id
                "#,
            )
            .bind(id)
            .bind(supply.id)
            .bind(generate_receipt_batch_number(received_at, id))
            .bind(quantity)
            .bind(receipt_expiration(supply, received_at))
            .bind(received_at)
            .bind(supply.unit_cost)
            .bind(request.location)
            .fetch_one(&mut *conn)
            .await?;
            return Ok(Some(batch_id));
        }
        BatchPatch::Unchanged => {}
    }

    Ok(patch.ledger_batch_id())
}

async fn set_batch_quantity(
    conn: &mut PgConnection,
    batch_id: Uuid,
    quantity: i64,
) -> AppResult<()> {
    sqlx::query("UPDATE inventory_batches SET quantity = $1 WHERE id = $2")
        .bind(quantity)
        .bind(batch_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn insert_movement(
    conn: &mut PgConnection,
    supply_id: Uuid,
    batch_id: Option<Uuid>,
    movement_type: MovementType,
    quantity: i64,
    change: StockChange,
    reason: &str,
    performed_by: Option<Uuid>,
    location: &str,
    notes: Option<&str>,
) -> AppResult<StockMovement> {
    let movement = sqlx::query_as::<_, StockMovement>(
        r#"
        INSERT INTO stock_movements (
            supply_id, batch_id, movement_type, quantity, previous_quantity, new_quantity,
            reason, performed_by, location, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(supply_id)
    .bind(batch_id)
    .bind(movement_type)
    .bind(quantity)
    .bind(change.previous_quantity)
    .bind(change.new_quantity)
    .bind(reason)
    .bind(performed_by)
    .bind(location)
    .bind(notes)
    .fetch_one(&mut *conn)
    .await?;

    Ok(movement)
}

/// Insert a reorder alert when stock is at or below the reorder point and
/// none is open for the supply
async fn raise_reorder_alert(
    conn: &mut PgConnection,
    supply: &Supply,
    new_stock: i64,
) -> AppResult<Option<Uuid>> {
    if new_stock > supply.reorder_point {
        return Ok(None);
    }

    let open = sqlx::query_as::<_, (Uuid, AlertType)>(
        "SELECT supply_id, alert_type FROM alerts WHERE supply_id = $1 AND NOT is_resolved",
    )
    .bind(supply.id)
    .fetch_all(&mut *conn)
    .await?;
    let mut index: OpenAlertIndex = open.into_iter().collect();

    let Some(draft) = plan_reorder_alert(supply, new_stock, &mut index) else {
        return Ok(None);
    };

    let alert = insert_alert(&mut *conn, &draft).await?;
    tracing::info!("Reorder alert raised for {} at stock {}", supply.name, new_stock);
    Ok(Some(alert.id))
}
