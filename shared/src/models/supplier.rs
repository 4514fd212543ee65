//! Supplier models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lead time assumed when a supply's supplier cannot be resolved
pub const DEFAULT_DELIVERY_DAYS: i32 = 7;

/// Rating given to newly registered suppliers
pub const DEFAULT_PERFORMANCE_RATING: i64 = 3;

/// A vendor supplying medical items
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: String,
    pub is_active: bool,
    pub performance_rating: Decimal,
    /// Average days from order to delivery
    pub average_delivery_time: i32,
    pub created_at: DateTime<Utc>,
}

/// Supplier with the number of supplies it provides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SupplierWithCount {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub supplier: Supplier,
    pub supply_count: i64,
}

/// Lead time for an optional supplier, falling back to the default
pub fn lead_time_days(supplier: Option<&Supplier>) -> i32 {
    supplier
        .map(|s| s.average_delivery_time)
        .unwrap_or(DEFAULT_DELIVERY_DAYS)
}
