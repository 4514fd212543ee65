//! Database models for the Medical Supply Inventory Platform
//!
//! Re-exports models from the shared crate and adds backend-specific models

pub use shared::models::*;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Select list for [`AlertWithSupply`] over `alerts a LEFT JOIN supplies s`
pub const ALERT_WITH_SUPPLY_COLUMNS: &str = "a.*, \
     COALESCE(s.name, 'Unknown') AS supply_name, \
     COALESCE(s.sku, 'Unknown') AS supply_sku";

/// Alert joined with the name and SKU of its supply
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AlertWithSupply {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub alert: Alert,
    pub supply_name: String,
    pub supply_sku: String,
}

/// Stock movement joined with supply and actor names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MovementWithNames {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movement: StockMovement,
    pub supply_name: String,
    pub user_name: String,
}

/// Batch expiring within a reporting window
#[derive(Debug, Clone, Serialize)]
pub struct ExpiringItem {
    pub batch_id: Uuid,
    pub batch_number: String,
    pub supply_id: Uuid,
    pub supply_name: String,
    pub category_name: String,
    pub quantity: i64,
    pub location: String,
    pub expiration_date: DateTime<Utc>,
    pub days_until_expiration: i64,
    pub is_expired: bool,
    pub value: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_supply_labels_fall_back_to_unknown() {
        assert!(ALERT_WITH_SUPPLY_COLUMNS.contains("COALESCE(s.name, 'Unknown') AS supply_name"));
        assert!(ALERT_WITH_SUPPLY_COLUMNS.contains("COALESCE(s.sku, 'Unknown') AS supply_sku"));
    }
}
