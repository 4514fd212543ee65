//! Stock accounting tests
//!
//! Tests for batch-backed stock accounting including:
//! - Stock on hand equals the sum of batch quantities
//! - Dispensing never drives a batch negative
//! - FEFO dispensing order
//! - How each movement patches batch rows

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    compute_stock_change, current_stock, draw_from_batch, generate_receipt_batch_number,
    plan_batch_patch, plan_fefo_draw, receipt_expiration, BatchPatch, DomainError,
    InventoryBatch, MovementType, StockEffect, Supply,
};
use uuid::Uuid;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

fn batch(quantity: i64, expires_in_days: Option<i64>) -> InventoryBatch {
    InventoryBatch {
        id: Uuid::new_v4(),
        supply_id: Uuid::nil(),
        batch_number: format!("LOT-{quantity}"),
        quantity,
        expiration_date: expires_in_days.map(|d| now() + Duration::days(d)),
        received_date: now() - Duration::days(3),
        cost: Decimal::new(125, 2),
        location: "Pharmacy".to_string(),
        is_quarantined: false,
        notes: None,
    }
}

fn supply(shelf_life_days: Option<i32>) -> Supply {
    Supply {
        id: Uuid::new_v4(),
        name: "Saline 0.9% 500ml".to_string(),
        description: String::new(),
        sku: "SAL-500".to_string(),
        barcode: None,
        category_id: Uuid::new_v4(),
        supplier_id: Uuid::new_v4(),
        unit_of_measure: "bag".to_string(),
        unit_cost: Decimal::new(340, 2),
        minimum_stock: 50,
        maximum_stock: 500,
        reorder_point: 40,
        reorder_quantity: 200,
        is_controlled_substance: false,
        requires_refrigeration: false,
        shelf_life_days,
        is_active: true,
        created_at: now(),
        updated_at: now(),
    }
}

/// Apply a FEFO plan to the batches, as the movement path does
fn apply_plan(batches: &mut Vec<InventoryBatch>, quantity: i64) {
    let patch = BatchPatch::Fefo(plan_fefo_draw(batches, quantity));
    apply_patch(batches, &patch, "Pharmacy");
}

/// Apply a batch patch in memory the way the movement path writes it
fn apply_patch(batches: &mut Vec<InventoryBatch>, patch: &BatchPatch, location: &str) {
    match patch {
        BatchPatch::Set {
            batch_id,
            quantity_after,
            ..
        } => {
            if let Some(b) = batches.iter_mut().find(|b| b.id == *batch_id) {
                b.quantity = *quantity_after;
            }
        }
        BatchPatch::Relocate { batch_id } => {
            if let Some(b) = batches.iter_mut().find(|b| b.id == *batch_id) {
                b.location = location.to_string();
            }
        }
        BatchPatch::Fefo(plan) => {
            for draw in &plan.draws {
                if let Some(b) = batches.iter_mut().find(|b| b.id == draw.batch_id) {
                    b.quantity = draw.remaining();
                }
            }
        }
        BatchPatch::Receive { quantity } => {
            let mut received = batch(*quantity, None);
            received.location = location.to_string();
            batches.push(received);
        }
        BatchPatch::Unchanged => {}
    }
}

const MOVEMENT_TYPES: [MovementType; 6] = [
    MovementType::In,
    MovementType::Out,
    MovementType::Adjustment,
    MovementType::Expired,
    MovementType::Damaged,
    MovementType::Transfer,
];

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_fefo_picks_batch_expiring_in_ten_days() {
        let far = batch(100, Some(200));
        let near = batch(100, Some(10));
        let mut batches = vec![far.clone(), near.clone()];

        apply_plan(&mut batches, 30);

        let near_after = batches.iter().find(|b| b.id == near.id).unwrap();
        let far_after = batches.iter().find(|b| b.id == far.id).unwrap();
        assert_eq!(near_after.quantity, 70);
        assert_eq!(far_after.quantity, 100);
    }

    #[test]
    fn test_dispense_spills_into_next_batch() {
        let first = batch(20, Some(5));
        let second = batch(50, Some(60));
        let mut batches = vec![second.clone(), first.clone()];

        apply_plan(&mut batches, 35);

        assert_eq!(current_stock(&batches), 35);
        assert_eq!(batches.iter().find(|b| b.id == first.id).unwrap().quantity, 0);
        assert_eq!(batches.iter().find(|b| b.id == second.id).unwrap().quantity, 35);
    }

    #[test]
    fn test_dispense_more_than_stock_rejected() {
        let batches = vec![batch(4, Some(10)), batch(3, None)];
        let err = compute_stock_change(current_stock(&batches), MovementType::Out, 8).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                requested: 8,
                available: 7
            }
        );
    }

    #[test]
    fn test_explicit_batch_overdraw_rejected() {
        let b = batch(5, Some(10));
        assert!(matches!(
            draw_from_batch(&b, 6),
            Err(DomainError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_adjustment_adds_and_write_offs_remove_stock() {
        assert_eq!(
            compute_stock_change(10, MovementType::Adjustment, 3).unwrap().new_quantity,
            13
        );
        assert_eq!(
            compute_stock_change(10, MovementType::Damaged, 3).unwrap().new_quantity,
            7
        );
        assert_eq!(
            compute_stock_change(10, MovementType::Expired, 10).unwrap().new_quantity,
            0
        );
    }

    #[test]
    fn test_receipt_batch_uses_shelf_life() {
        let received = now();
        assert_eq!(
            receipt_expiration(&supply(Some(365)), received),
            Some(received + Duration::days(365))
        );
        assert_eq!(receipt_expiration(&supply(None), received), None);
    }

    #[test]
    fn test_receipt_batch_number_format() {
        let id = Uuid::parse_str("0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0").unwrap();
        assert_eq!(generate_receipt_batch_number(now(), id), "RCV-20240315-0f1e2d3c");
    }

    #[test]
    fn test_movement_naming_another_supplies_batch_is_rejected() {
        let own = vec![batch(40, Some(60))];
        let foreign = batch(40, Some(60));

        for effect in [StockEffect::Increase, StockEffect::Decrease, StockEffect::Neutral] {
            assert_eq!(
                plan_batch_patch(effect, Some(foreign.id), &own, 5),
                Err(DomainError::BatchNotFound(foreign.id))
            );
        }
    }

    #[test]
    fn test_transfer_relocates_named_batch_only() {
        let mut batches = vec![batch(25, Some(60)), batch(15, Some(90))];
        let target = batches[1].id;
        let patch = plan_batch_patch(StockEffect::Neutral, Some(target), &batches, 15).unwrap();
        assert_eq!(patch, BatchPatch::Relocate { batch_id: target });

        apply_patch(&mut batches, &patch, "Ward 4 Cabinet");
        assert_eq!(current_stock(&batches), 40);
        assert_eq!(batches[1].location, "Ward 4 Cabinet");
        assert_eq!(batches[0].location, "Pharmacy");
    }

    #[test]
    fn test_transfer_without_batch_changes_nothing() {
        let batches = vec![batch(25, Some(60))];
        let patch = plan_batch_patch(StockEffect::Neutral, None, &batches, 10).unwrap();
        assert_eq!(patch, BatchPatch::Unchanged);
        assert_eq!(patch.ledger_batch_id(), None);
    }

    #[test]
    fn test_receipt_without_batch_creates_one() {
        let mut batches = vec![batch(25, Some(60))];
        let patch = plan_batch_patch(StockEffect::Increase, None, &batches, 120).unwrap();
        assert_eq!(patch, BatchPatch::Receive { quantity: 120 });

        apply_patch(&mut batches, &patch, "Receiving Dock");
        assert_eq!(batches.len(), 2);
        assert_eq!(current_stock(&batches), 145);
    }

    #[test]
    fn test_dispense_without_batch_spans_batches_fefo() {
        let mut batches = vec![batch(30, Some(90)), batch(10, Some(10)), batch(20, Some(40))];
        let patch = plan_batch_patch(StockEffect::Decrease, None, &batches, 25).unwrap();

        let BatchPatch::Fefo(plan) = &patch else {
            panic!("expected a FEFO plan, got {patch:?}");
        };
        let drawn: Vec<(Uuid, i64)> = plan.draws.iter().map(|d| (d.batch_id, d.drawn)).collect();
        assert_eq!(drawn, vec![(batches[1].id, 10), (batches[2].id, 15)]);
        assert_eq!(patch.ledger_batch_id(), None);

        apply_patch(&mut batches, &patch, "Pharmacy");
        let left: Vec<i64> = batches.iter().map(|b| b.quantity).collect();
        assert_eq!(left, vec![30, 0, 5]);
    }

    #[test]
    fn test_named_batch_dispense_cannot_overdraw() {
        let batches = vec![batch(8, Some(20)), batch(100, Some(200))];
        assert!(matches!(
            plan_batch_patch(StockEffect::Decrease, Some(batches[0].id), &batches, 9),
            Err(DomainError::InsufficientStock {
                requested: 9,
                available: 8
            })
        ));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn batch_strategy() -> impl Strategy<Value = InventoryBatch> {
        (0i64..=500, prop::option::of(-30i64..=365))
            .prop_map(|(quantity, expires)| batch(quantity, expires))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Stock on hand is always the sum of batch quantities
        #[test]
        fn prop_stock_is_sum_of_batches(
            batches in prop::collection::vec(batch_strategy(), 0..12)
        ) {
            let expected: i64 = batches.iter().map(|b| b.quantity).sum();
            prop_assert_eq!(current_stock(&batches), expected);
        }

        /// Dispensing up to the stock on hand leaves stock - quantity and no negative batch
        #[test]
        fn prop_dispense_keeps_batches_non_negative(
            mut batches in prop::collection::vec(batch_strategy(), 1..12),
            fraction in 0.0f64..=1.0
        ) {
            let stock = current_stock(&batches);
            prop_assume!(stock > 0);
            let quantity = ((stock as f64 * fraction).ceil() as i64).clamp(1, stock);

            let change = compute_stock_change(stock, MovementType::Out, quantity).unwrap();
            apply_plan(&mut batches, quantity);

            prop_assert_eq!(change.new_quantity, stock - quantity);
            prop_assert_eq!(current_stock(&batches), change.new_quantity);
            prop_assert!(batches.iter().all(|b| b.quantity >= 0));
        }

        /// The ledger snapshot always agrees with the movement direction
        #[test]
        fn prop_ledger_snapshot_matches_direction(
            current in 0i64..10_000,
            quantity in 1i64..1_000
        ) {
            let received = compute_stock_change(current, MovementType::In, quantity).unwrap();
            prop_assert_eq!(received.delta(), quantity);

            let moved = compute_stock_change(current, MovementType::Transfer, quantity).unwrap();
            prop_assert_eq!(moved.delta(), 0);

            let dispensed = compute_stock_change(current, MovementType::Out, quantity);
            prop_assert_eq!(dispensed.is_ok(), quantity <= current);
        }

        /// A FEFO split draws exactly the requested units when stock covers them
        #[test]
        fn prop_fefo_split_conserves_quantity(
            batches in prop::collection::vec(batch_strategy(), 1..12),
            quantity in 1i64..3_000
        ) {
            let stock = current_stock(&batches);
            let patch = plan_batch_patch(StockEffect::Decrease, None, &batches, quantity).unwrap();
            let BatchPatch::Fefo(plan) = &patch else {
                return Err(TestCaseError::fail("decrease without a batch must plan FEFO"));
            };

            prop_assert_eq!(plan.allocated() + plan.unallocated, quantity);
            prop_assert_eq!(plan.unallocated, (quantity - stock).max(0));
            prop_assert!(plan.draws.iter().all(|d| d.drawn > 0 && d.remaining() >= 0));
        }

        /// Applying the patch moves summed batch stock exactly as the ledger records
        #[test]
        fn prop_patch_matches_ledger(
            mut batches in prop::collection::vec(batch_strategy(), 1..8),
            type_index in 0usize..6,
            pick in prop::option::of(0usize..8),
            quantity in 1i64..400
        ) {
            let movement_type = MOVEMENT_TYPES[type_index];
            let batch_id = pick.map(|i| batches[i % batches.len()].id);
            let stock = current_stock(&batches);

            let Ok(change) = compute_stock_change(stock, movement_type, quantity) else {
                return Ok(());
            };
            let Ok(patch) = plan_batch_patch(movement_type.effect(), batch_id, &batches, quantity)
            else {
                // only a named batch too small for the decrease may fail here
                prop_assert_eq!(movement_type.effect(), StockEffect::Decrease);
                prop_assert!(batch_id.is_some());
                return Ok(());
            };

            apply_patch(&mut batches, &patch, "Ward 2");
            prop_assert_eq!(patch.stock_delta(), change.delta());
            prop_assert_eq!(current_stock(&batches), change.new_quantity);
        }
    }
}
