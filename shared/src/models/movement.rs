//! Stock movement ledger models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of stock change recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "movement_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
    Expired,
    Damaged,
    Transfer,
}

/// How a movement changes the total stock of its supply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    Increase,
    Decrease,
    /// Moves stock between locations; totals are unchanged
    Neutral,
}

impl MovementType {
    pub fn effect(&self) -> StockEffect {
        match self {
            MovementType::In | MovementType::Adjustment => StockEffect::Increase,
            MovementType::Out | MovementType::Expired | MovementType::Damaged => {
                StockEffect::Decrease
            }
            MovementType::Transfer => StockEffect::Neutral,
        }
    }

    /// Whether this movement is a dispense. Reorder forecasts and anomaly
    /// detection count only these.
    pub fn is_usage(&self) -> bool {
        matches!(self, MovementType::Out)
    }

    /// Whether this movement is recorded in the daily `usage_analytics`
    /// totals. Every decrease is, write-offs included.
    pub fn records_usage(&self) -> bool {
        self.effect() == StockEffect::Decrease
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjustment => "adjustment",
            MovementType::Expired => "expired",
            MovementType::Damaged => "damaged",
            MovementType::Transfer => "transfer",
        }
    }
}

/// An immutable ledger entry. Never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: Uuid,
    pub supply_id: Uuid,
    pub batch_id: Option<Uuid>,
    pub movement_type: MovementType,
    pub quantity: i64,
    /// Total stock of the supply before this movement
    pub previous_quantity: i64,
    /// Total stock of the supply after this movement
    pub new_quantity: i64,
    pub reason: String,
    /// `None` for system-generated movements
    pub performed_by: Option<Uuid>,
    pub location: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Barcode scanner actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    Lookup,
    Receive,
    Dispense,
}

impl ScanAction {
    /// Ledger movement type for stock-changing actions
    pub fn movement_type(&self) -> Option<MovementType> {
        match self {
            ScanAction::Lookup => None,
            ScanAction::Receive => Some(MovementType::In),
            ScanAction::Dispense => Some(MovementType::Out),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanAction::Lookup => "lookup",
            ScanAction::Receive => "receive",
            ScanAction::Dispense => "dispense",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispense_and_write_off_usage_classification() {
        assert_eq!(MovementType::Out.effect(), StockEffect::Decrease);
        assert!(MovementType::Out.is_usage());
        assert!(!MovementType::Expired.is_usage());
        assert!(!MovementType::Damaged.is_usage());
        assert!(MovementType::Out.records_usage());
        assert!(MovementType::Expired.records_usage());
        assert!(MovementType::Damaged.records_usage());
        assert!(!MovementType::Adjustment.records_usage());
        assert!(!MovementType::Transfer.records_usage());
    }

    #[test]
    fn test_movement_type_serde_names() {
        let json = serde_json::to_string(&MovementType::Adjustment).unwrap();
        assert_eq!(json, "\"adjustment\"");
        let parsed: MovementType = serde_json::from_str("\"damaged\"").unwrap();
        assert_eq!(parsed, MovementType::Damaged);
    }

    #[test]
    fn test_scan_action_movement_types() {
        assert_eq!(ScanAction::Lookup.movement_type(), None);
        assert_eq!(ScanAction::Receive.movement_type(), Some(MovementType::In));
        assert_eq!(ScanAction::Dispense.movement_type(), Some(MovementType::Out));
    }
}
