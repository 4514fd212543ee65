//! Supply (catalog item) models and stock status classification

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stocked medical item. Stock on hand is derived from its batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supply {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub category_id: Uuid,
    pub supplier_id: Uuid,
    pub unit_of_measure: String,
    pub unit_cost: Decimal,
    pub minimum_stock: i64,
    pub maximum_stock: i64,
    pub reorder_point: i64,
    pub reorder_quantity: i64,
    pub is_controlled_substance: bool,
    pub requires_refrigeration: bool,
    pub shelf_life_days: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supply {
    pub fn thresholds(&self) -> StockThresholds {
        StockThresholds {
            minimum_stock: self.minimum_stock,
            reorder_point: self.reorder_point,
        }
    }

    /// Stock status at the given stock level
    pub fn stock_status(&self, current_stock: i64) -> StockStatus {
        classify_stock(current_stock, &self.thresholds())
    }
}

/// The thresholds that drive stock status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockThresholds {
    pub minimum_stock: i64,
    pub reorder_point: i64,
}

/// Stock level classification shown wherever a supply is listed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// At or below the reorder point
    Critical,
    /// Above the reorder point but at or below minimum stock
    Low,
    Normal,
}

impl StockStatus {
    /// Sort priority, highest first in listings
    pub fn priority(&self) -> u8 {
        match self {
            StockStatus::Critical => 3,
            StockStatus::Low => 2,
            StockStatus::Normal => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Critical => "critical",
            StockStatus::Low => "low",
            StockStatus::Normal => "normal",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify a stock level against its thresholds.
///
/// The reorder point is checked first, so a supply whose reorder point is
/// above its minimum stock is `Critical` before it is ever `Low`.
pub fn classify_stock(current_stock: i64, thresholds: &StockThresholds) -> StockStatus {
    if current_stock <= thresholds.reorder_point {
        StockStatus::Critical
    } else if current_stock <= thresholds.minimum_stock {
        StockStatus::Low
    } else {
        StockStatus::Normal
    }
}

/// Listing order: most urgent status first, then by name
pub fn listing_order(a: (StockStatus, &str), b: (StockStatus, &str)) -> std::cmp::Ordering {
    b.0.priority()
        .cmp(&a.0.priority())
        .then_with(|| a.1.cmp(b.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds(minimum_stock: i64, reorder_point: i64) -> StockThresholds {
        StockThresholds {
            minimum_stock,
            reorder_point,
        }
    }

    #[test]
    fn test_classify_stock_boundaries() {
        let t = thresholds(1000, 500);
        assert_eq!(classify_stock(0, &t), StockStatus::Critical);
        assert_eq!(classify_stock(500, &t), StockStatus::Critical);
        assert_eq!(classify_stock(501, &t), StockStatus::Low);
        assert_eq!(classify_stock(1000, &t), StockStatus::Low);
        assert_eq!(classify_stock(1001, &t), StockStatus::Normal);
    }

    #[test]
    fn test_reorder_point_above_minimum() {
        // Surgical masks: minimum 1000, reorder point 2000
        let t = thresholds(1000, 2000);
        assert_eq!(classify_stock(1500, &t), StockStatus::Critical);
        assert_eq!(classify_stock(2001, &t), StockStatus::Normal);
    }

    #[test]
    fn test_listing_order() {
        let mut rows = vec![
            (StockStatus::Normal, "Alcohol Swabs"),
            (StockStatus::Low, "Gauze"),
            (StockStatus::Critical, "Syringes"),
            (StockStatus::Low, "Bandages"),
        ];
        rows.sort_by(|a, b| listing_order(*a, *b));
        assert_eq!(
            rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            vec!["Syringes", "Bandages", "Gauze", "Alcohol Swabs"]
        );
    }

    #[test]
    fn test_status_priority_order() {
        assert!(StockStatus::Critical.priority() > StockStatus::Low.priority());
        assert!(StockStatus::Low.priority() > StockStatus::Normal.priority());
    }
}
