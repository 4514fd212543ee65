//! Inventory batch (received lot) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A discrete received lot of a supply.
///
/// Batches are the authoritative record of stock on hand; `quantity` never
/// drops below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryBatch {
    pub id: Uuid,
    pub supply_id: Uuid,
    pub batch_number: String,
    pub quantity: i64,
    pub expiration_date: Option<DateTime<Utc>>,
    pub received_date: DateTime<Utc>,
    /// Unit cost paid for this batch
    pub cost: Decimal,
    pub location: String,
    pub is_quarantined: bool,
    pub notes: Option<String>,
}

impl InventoryBatch {
    /// Value of the units remaining in this batch
    pub fn value(&self) -> Decimal {
        Decimal::from(self.quantity) * self.cost
    }

    /// Whether the batch expires at or before `cutoff`
    pub fn expires_by(&self, cutoff: DateTime<Utc>) -> bool {
        self.expiration_date.map_or(false, |exp| exp <= cutoff)
    }
}

/// Generate the batch number for stock received without an explicit batch
pub fn generate_receipt_batch_number(received_at: DateTime<Utc>, id: Uuid) -> String {
    let simple = id.simple().to_string();
    format!("RCV-{}-{}", received_at.format("%Y%m%d"), &simple[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_receipt_batch_number_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 8, 30, 0).unwrap();
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(generate_receipt_batch_number(at, id), "RCV-20240309-67e55044");
    }
}
