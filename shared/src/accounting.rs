//! Stock accounting rules
//!
//! Batches are the source of truth for stock on hand. Every stock-changing
//! path computes its ledger snapshot with [`compute_stock_change`] and patches
//! batches as decided by [`plan_batch_patch`]: a named batch, a FEFO plan
//! ([`plan_fefo_draw`]) or a new receipt batch.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::{InventoryBatch, MovementType, StockEffect, Supply};

/// Total units on hand across all batches, quarantined ones included
pub fn current_stock(batches: &[InventoryBatch]) -> i64 {
    batches.iter().map(|b| b.quantity).sum()
}

/// Total value of stock on hand at batch cost
pub fn total_value(batches: &[InventoryBatch]) -> Decimal {
    batches.iter().map(InventoryBatch::value).sum()
}

/// Stock totals before and after a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    pub previous_quantity: i64,
    pub new_quantity: i64,
}

impl StockChange {
    pub fn delta(&self) -> i64 {
        self.new_quantity - self.previous_quantity
    }
}

/// Compute the stock snapshot for a movement of `quantity` units
pub fn compute_stock_change(
    current: i64,
    movement_type: MovementType,
    quantity: i64,
) -> DomainResult<StockChange> {
    if quantity <= 0 {
        return Err(DomainError::InvalidQuantity(quantity));
    }

    let new_quantity = match movement_type.effect() {
        StockEffect::Increase => current + quantity,
        StockEffect::Decrease => current - quantity,
        StockEffect::Neutral => current,
    };

    if new_quantity < 0 {
        return Err(DomainError::InsufficientStock {
            requested: quantity,
            available: current,
        });
    }

    Ok(StockChange {
        previous_quantity: current,
        new_quantity,
    })
}

/// Remaining quantity of `batch` after drawing `quantity` units from it
pub fn draw_from_batch(batch: &InventoryBatch, quantity: i64) -> DomainResult<i64> {
    if quantity <= 0 {
        return Err(DomainError::InvalidQuantity(quantity));
    }
    if quantity > batch.quantity {
        return Err(DomainError::InsufficientStock {
            requested: quantity,
            available: batch.quantity,
        });
    }
    Ok(batch.quantity - quantity)
}

/// Sort batches first-expiry-first-out.
///
/// Batches without an expiration date go last; ties fall back to the
/// earliest received.
pub fn fefo_order(batches: &mut [InventoryBatch]) {
    batches.sort_by(|a, b| {
        a.expiration_date
            .is_none()
            .cmp(&b.expiration_date.is_none())
            .then(a.expiration_date.cmp(&b.expiration_date))
            .then(a.received_date.cmp(&b.received_date))
    });
}

/// One batch decrement within a FEFO plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDraw {
    pub batch_id: Uuid,
    pub quantity_before: i64,
    pub drawn: i64,
}

impl BatchDraw {
    pub fn remaining(&self) -> i64 {
        self.quantity_before - self.drawn
    }
}

/// How a dispense request is spread over batches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FefoPlan {
    pub draws: Vec<BatchDraw>,
    /// Units that could not be taken from any batch
    pub unallocated: i64,
}

impl FefoPlan {
    pub fn allocated(&self) -> i64 {
        self.draws.iter().map(|d| d.drawn).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.unallocated == 0
    }
}

/// Plan a FEFO draw of `quantity` units. Empty batches are skipped.
pub fn plan_fefo_draw(batches: &[InventoryBatch], quantity: i64) -> FefoPlan {
    let mut ordered: Vec<InventoryBatch> = batches.to_vec();
    fefo_order(&mut ordered);

    let mut remaining = quantity.max(0);
    let mut draws = Vec::new();

    for batch in ordered.iter().filter(|b| b.quantity > 0) {
        if remaining == 0 {
            break;
        }
        let drawn = remaining.min(batch.quantity);
        draws.push(BatchDraw {
            batch_id: batch.id,
            quantity_before: batch.quantity,
            drawn,
        });
        remaining -= drawn;
    }

    FefoPlan {
        draws,
        unallocated: remaining,
    }
}

/// How a movement is applied to the batch rows of its supply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchPatch {
    /// Set a named batch to a new quantity
    Set {
        batch_id: Uuid,
        quantity_before: i64,
        quantity_after: i64,
    },
    /// Move a named batch to the movement's location
    Relocate { batch_id: Uuid },
    /// Decrement batches first-expiry-first-out
    Fefo(FefoPlan),
    /// Create a receipt batch holding the received units
    Receive { quantity: i64 },
    /// Transfer without a batch
    Unchanged,
}

impl BatchPatch {
    /// Change to the summed batch quantities once applied
    pub fn stock_delta(&self) -> i64 {
        match self {
            BatchPatch::Set {
                quantity_before,
                quantity_after,
                ..
            } => quantity_after - quantity_before,
            BatchPatch::Fefo(plan) => -plan.allocated(),
            BatchPatch::Receive { quantity } => *quantity,
            BatchPatch::Relocate { .. } | BatchPatch::Unchanged => 0,
        }
    }

    /// Batch the ledger entry references. A FEFO draw is linked only when
    /// it touched exactly one batch; a receipt batch gets its id on insert.
    pub fn ledger_batch_id(&self) -> Option<Uuid> {
        match self {
            BatchPatch::Set { batch_id, .. } | BatchPatch::Relocate { batch_id } => Some(*batch_id),
            BatchPatch::Fefo(plan) => match plan.draws.as_slice() {
                [single] => Some(single.batch_id),
                _ => None,
            },
            BatchPatch::Receive { .. } | BatchPatch::Unchanged => None,
        }
    }
}

/// Decide how a movement of `quantity` units patches `batches`.
///
/// `batches` must be every batch of the supply. A named batch that is not
/// among them fails with [`DomainError::BatchNotFound`].
pub fn plan_batch_patch(
    effect: StockEffect,
    batch_id: Option<Uuid>,
    batches: &[InventoryBatch],
    quantity: i64,
) -> DomainResult<BatchPatch> {
    if quantity <= 0 {
        return Err(DomainError::InvalidQuantity(quantity));
    }

    let Some(batch_id) = batch_id else {
        return Ok(match effect {
            StockEffect::Increase => BatchPatch::Receive { quantity },
            StockEffect::Decrease => BatchPatch::Fefo(plan_fefo_draw(batches, quantity)),
            StockEffect::Neutral => BatchPatch::Unchanged,
        });
    };

    let batch = batches
        .iter()
        .find(|b| b.id == batch_id)
        .ok_or(DomainError::BatchNotFound(batch_id))?;

    Ok(match effect {
        StockEffect::Increase => BatchPatch::Set {
            batch_id,
            quantity_before: batch.quantity,
            quantity_after: batch.quantity + quantity,
        },
        StockEffect::Decrease => BatchPatch::Set {
            batch_id,
            quantity_before: batch.quantity,
            quantity_after: draw_from_batch(batch, quantity)?,
        },
        StockEffect::Neutral => BatchPatch::Relocate { batch_id },
    })
}

/// Expiration assigned to stock received without a batch
pub fn receipt_expiration(supply: &Supply, received_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    supply
        .shelf_life_days
        .map(|days| received_at + Duration::days(i64::from(days)))
}

/// Stock expiring by a cutoff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringSummary {
    pub quantity: i64,
    pub next_expiration: Option<DateTime<Utc>>,
}

/// Non-empty batches expiring at or before `cutoff`, soonest first
pub fn expiring_batches(
    batches: &[InventoryBatch],
    cutoff: DateTime<Utc>,
) -> Vec<&InventoryBatch> {
    let mut expiring: Vec<&InventoryBatch> = batches
        .iter()
        .filter(|b| b.quantity > 0 && b.expires_by(cutoff))
        .collect();
    expiring.sort_by_key(|b| b.expiration_date);
    expiring
}

/// Units in non-empty batches expiring at or before `cutoff`, and the earliest such date
pub fn expiring_summary(batches: &[InventoryBatch], cutoff: DateTime<Utc>) -> ExpiringSummary {
    expiring_batches(batches, cutoff)
        .into_iter()
        .fold(ExpiringSummary::default(), |acc, b| ExpiringSummary {
            quantity: acc.quantity + b.quantity,
            next_expiration: match (acc.next_expiration, b.expiration_date) {
                (Some(a), Some(e)) => Some(a.min(e)),
                (a, e) => a.or(e),
            },
        })
}

/// Reject deleting a record that other records still reference
pub fn ensure_no_dependents(resource: &str, dependents: i64) -> DomainResult<()> {
    if dependents > 0 {
        return Err(DomainError::conflict(
            resource,
            format!("Cannot delete {resource} with {dependents} associated supplies"),
        ));
    }
    Ok(())
}
