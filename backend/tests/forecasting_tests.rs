//! Forecasting and analytics tests
//!
//! Tests for reorder suggestions, usage anomalies and inventory analytics

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    days_until_stockout, detect_usage_anomalies, inventory_analytics, rank_suggestions,
    reorder_suggestion, suggested_order_quantity, turnover_rate, AnalyticsPeriod, MovementType,
    StockMovement, StockPosition, Supplier, Supply, Urgency,
};
use uuid::Uuid;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 20, 10, 0, 0).unwrap()
}

fn supply(reorder_quantity: i64) -> Supply {
    Supply {
        id: Uuid::new_v4(),
        name: "Surgical Masks".to_string(),
        description: String::new(),
        sku: "MSK-50".to_string(),
        barcode: None,
        category_id: Uuid::new_v4(),
        supplier_id: Uuid::new_v4(),
        unit_of_measure: "box".to_string(),
        unit_cost: Decimal::new(800, 2),
        minimum_stock: 40,
        maximum_stock: 400,
        reorder_point: 30,
        reorder_quantity,
        is_controlled_substance: false,
        requires_refrigeration: false,
        shelf_life_days: None,
        is_active: true,
        created_at: now(),
        updated_at: now(),
    }
}

fn supplier(average_delivery_time: i32) -> Supplier {
    Supplier {
        id: Uuid::new_v4(),
        name: "Northwind Medical".to_string(),
        contact_email: "orders@northwind.example".to_string(),
        contact_phone: "555-0100".to_string(),
        address: "1 Harbor Rd".to_string(),
        is_active: true,
        performance_rating: Decimal::from(3),
        average_delivery_time,
        created_at: now(),
    }
}

fn movement(movement_type: MovementType, quantity: i64, days_ago: i64) -> StockMovement {
    StockMovement {
        id: Uuid::new_v4(),
        supply_id: Uuid::nil(),
        batch_id: None,
        movement_type,
        quantity,
        previous_quantity: 0,
        new_quantity: 0,
        reason: "test".to_string(),
        performed_by: None,
        location: "Main".to_string(),
        notes: None,
        created_at: now() - Duration::days(days_ago),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_ten_per_day_stock_fifty_lead_five() {
        let s = supply(100);
        let suggestion = reorder_suggestion(&s, Some(&supplier(5)), 50, 300).unwrap();

        assert_eq!(suggestion.average_daily_usage, 10.0);
        assert_eq!(suggestion.days_until_stockout, 5);
        assert_eq!(suggestion.urgency, Urgency::High);
        assert_eq!(suggestion.suggested_quantity, 190);
        assert_eq!(suggestion.estimated_cost, Decimal::new(152000, 2));
        assert_eq!(
            suggestion.reason,
            "Based on 300 units used in last 30 days (10.0/day average)"
        );
    }

    #[test]
    fn test_reorder_quantity_wins_when_larger() {
        let s = supply(500);
        let suggestion = reorder_suggestion(&s, Some(&supplier(5)), 50, 300).unwrap();
        assert_eq!(suggestion.suggested_quantity, 500);
    }

    #[test]
    fn test_no_suggestion_without_usage() {
        assert!(reorder_suggestion(&supply(10), None, 0, 0).is_none());
    }

    #[test]
    fn test_no_suggestion_when_stock_outlasts_lead_time() {
        // 1/day, 100 in stock, lead 7 -> 100 days left
        assert!(reorder_suggestion(&supply(10), Some(&supplier(7)), 100, 30).is_none());
    }

    #[test]
    fn test_missing_supplier_assumes_seven_days() {
        // 2/day, 24 in stock -> 12 days, trigger at 7 + 5
        let suggestion = reorder_suggestion(&supply(10), None, 24, 60).unwrap();
        assert_eq!(suggestion.lead_time_days, 7);
        assert_eq!(suggestion.urgency, Urgency::Medium);
        assert_eq!(suggestion.suggested_quantity, 42);
    }

    #[test]
    fn test_rank_is_stable_by_urgency() {
        let a = reorder_suggestion(&supply(10), None, 24, 60).unwrap();
        let b = reorder_suggestion(&supply(10), None, 2, 60).unwrap();
        let c = reorder_suggestion(&supply(10), None, 20, 60).unwrap();
        let mut ranked = vec![a.clone(), b.clone(), c.clone()];
        rank_suggestions(&mut ranked);

        assert_eq!(ranked[0].supply_id, b.supply_id);
        assert_eq!(ranked[1].supply_id, a.supply_id);
        assert_eq!(ranked[2].supply_id, c.supply_id);
    }

    #[test]
    fn test_anomaly_detected_on_spike_day() {
        let spike_day = now() - Duration::days(2);
        let mut outbound: Vec<(DateTime<Utc>, i64)> =
            (3..10).map(|d| (now() - Duration::days(d), 1)).collect();
        outbound.push((spike_day, 10));

        // total 17 over 7 days -> avg ~2.43, threshold ~4.86
        let anomalies = detect_usage_anomalies(&outbound, 7);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].anomaly_type, "high_usage");
        assert_eq!(anomalies[0].date, spike_day.date_naive());
        assert_eq!(anomalies[0].value, 10);
        assert!(anomalies[0].message.contains("312% above average"));
    }

    #[test]
    fn test_turnover_rate_formatting() {
        assert_eq!(turnover_rate(100, Decimal::ZERO, 30), "0");
        assert_eq!(turnover_rate(730, Decimal::from(1000), 365), "0.73");
    }

    #[test]
    fn test_inventory_analytics_totals() {
        let s = supply(10);
        let movements = vec![
            movement(MovementType::In, 100, 10),
            movement(MovementType::Out, 20, 5),
            movement(MovementType::Out, 10, 1),
            movement(MovementType::Damaged, 5, 1),
            movement(MovementType::Transfer, 7, 1),
        ];
        let positions = vec![StockPosition {
            current_stock: 25,
            value: Decimal::from(200),
            supply: s,
        }];

        let analytics = inventory_analytics(AnalyticsPeriod::Week, &movements, &positions);
        assert_eq!(analytics.total_movements, 5);
        assert_eq!(analytics.total_received, 100);
        assert_eq!(analytics.total_dispensed, 30);
        assert_eq!(analytics.total_inventory_value, Decimal::from(200));
        assert_eq!(analytics.critical_stock_items, 1);
        assert_eq!(analytics.low_stock_items, 0);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Suggested quantity always covers lead time plus safety stock
        #[test]
        fn prop_suggested_quantity_covers_window(
            reorder_quantity in 0i64..1000,
            avg in 0.1f64..200.0,
            lead in 1i32..60
        ) {
            let qty = suggested_order_quantity(reorder_quantity, avg, lead);
            prop_assert!(qty >= reorder_quantity);
            prop_assert!(qty as f64 >= avg * f64::from(lead + 14) - 1e-6);
        }

        /// Days until stockout never overstates how long stock lasts
        #[test]
        fn prop_days_until_stockout_floor(stock in 0i64..100_000, avg in 0.01f64..500.0) {
            let days = days_until_stockout(stock, avg).unwrap();
            prop_assert!(days as f64 * avg <= stock as f64 + 1e-3);
        }

        /// Every reported anomaly is above twice the average
        #[test]
        fn prop_anomalies_exceed_threshold(
            daily in prop::collection::vec(0i64..100, 1..30)
        ) {
            let outbound: Vec<(DateTime<Utc>, i64)> = daily
                .iter()
                .enumerate()
                .map(|(i, q)| (now() - Duration::days(i as i64), *q))
                .collect();
            let period = daily.len() as i64;
            for anomaly in detect_usage_anomalies(&outbound, period) {
                prop_assert!(anomaly.value as f64 > anomaly.threshold);
            }
        }
    }
}
