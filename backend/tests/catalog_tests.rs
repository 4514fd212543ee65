//! Catalog rule tests
//!
//! Tests for category/supplier deletion guards, stock thresholds, field
//! formats and the supply listing order

use proptest::prelude::*;
use shared::{
    classify_stock, ensure_no_dependents, listing_order, validate_barcode, validate_color,
    validate_sku, validate_stock_thresholds, DomainError, StockStatus, StockThresholds,
};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_category_delete_rejected_while_referenced() {
        let err = ensure_no_dependents("category", 3).unwrap_err();
        assert_eq!(
            err,
            DomainError::Conflict {
                resource: "category".to_string(),
                message: "Cannot delete category with 3 associated supplies".to_string(),
            }
        );
    }

    #[test]
    fn test_category_delete_accepted_at_zero() {
        assert!(ensure_no_dependents("category", 0).is_ok());
    }

    #[test]
    fn test_supplier_delete_guard() {
        assert!(ensure_no_dependents("supplier", 1).is_err());
        assert!(ensure_no_dependents("supplier", 0).is_ok());
    }

    #[test]
    fn test_thresholds() {
        assert!(validate_stock_thresholds(10, 100, 20, 50).is_ok());
        assert!(validate_stock_thresholds(100, 10, 20, 50).is_err());
        assert!(validate_stock_thresholds(10, 100, -1, 50).is_err());
        assert!(validate_stock_thresholds(10, 100, 20, 0).is_err());
    }

    #[test]
    fn test_field_formats() {
        assert!(validate_sku("GLV-NIT-M").is_ok());
        assert!(validate_sku("glv").is_err());
        assert!(validate_sku("X").is_err());

        assert!(validate_color("#1E90FF").is_ok());
        assert!(validate_color("1E90FF").is_err());
        assert!(validate_color("#12345").is_err());

        assert!(validate_barcode("0123456789012").is_ok());
        assert!(validate_barcode("1234567").is_err());
        assert!(validate_barcode("12345678AB").is_err());
    }

    #[test]
    fn test_stock_status_boundaries() {
        let t = StockThresholds {
            minimum_stock: 100,
            reorder_point: 40,
        };
        assert_eq!(classify_stock(40, &t), StockStatus::Critical);
        assert_eq!(classify_stock(41, &t), StockStatus::Low);
        assert_eq!(classify_stock(100, &t), StockStatus::Low);
        assert_eq!(classify_stock(101, &t), StockStatus::Normal);
    }

    #[test]
    fn test_listing_order_puts_critical_first_then_name() {
        let mut rows = vec![
            (StockStatus::Normal, "Alcohol Swabs"),
            (StockStatus::Critical, "Syringes"),
            (StockStatus::Low, "Bandages"),
            (StockStatus::Critical, "Gauze"),
        ];
        rows.sort_by(|a, b| listing_order(*a, *b));
        let names: Vec<&str> = rows.iter().map(|r| r.1).collect();
        assert_eq!(names, vec!["Gauze", "Syringes", "Bandages", "Alcohol Swabs"]);
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

        /// Deletion is allowed exactly when nothing references the record
        #[test]
        fn prop_delete_guard(dependents in 0i64..1000) {
            prop_assert_eq!(ensure_no_dependents("category", dependents).is_ok(), dependents == 0);
        }

        /// Generated SKUs in the documented alphabet are accepted
        #[test]
        fn prop_valid_sku_accepted(sku in "[A-Z0-9-]{2,32}") {
            prop_assert!(validate_sku(&sku).is_ok());
        }

        /// Stock at or below the reorder point is always critical
        #[test]
        fn prop_at_or_below_reorder_point_is_critical(
            reorder_point in 0i64..10_000,
            below in 0i64..10_000,
            minimum in 0i64..10_000
        ) {
            let t = StockThresholds { minimum_stock: minimum, reorder_point };
            prop_assert_eq!(classify_stock(reorder_point - below, &t), StockStatus::Critical);
        }
    }
}
