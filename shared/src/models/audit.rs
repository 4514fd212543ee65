//! Audit trail models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Audited actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    CreateSupplier,
    UpdateSupplier,
    DeleteSupplier,
    CreateSupply,
    UpdateSupply,
    DeactivateSupply,
    StockMovement,
    AddInventoryBatch,
    QuarantineBatch,
    BarcodeScan,
    MarkAlertRead,
    ResolveAlert,
    InitializeUserRole,
    UpdateUserRole,
    SeedSampleData,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CreateCategory => "CREATE_CATEGORY",
            AuditAction::UpdateCategory => "UPDATE_CATEGORY",
            AuditAction::DeleteCategory => "DELETE_CATEGORY",
            AuditAction::CreateSupplier => "CREATE_SUPPLIER",
            AuditAction::UpdateSupplier => "UPDATE_SUPPLIER",
            AuditAction::DeleteSupplier => "DELETE_SUPPLIER",
            AuditAction::CreateSupply => "CREATE_SUPPLY",
            AuditAction::UpdateSupply => "UPDATE_SUPPLY",
            AuditAction::DeactivateSupply => "DEACTIVATE_SUPPLY",
            AuditAction::StockMovement => "STOCK_MOVEMENT",
            AuditAction::AddInventoryBatch => "ADD_INVENTORY_BATCH",
            AuditAction::QuarantineBatch => "QUARANTINE_BATCH",
            AuditAction::BarcodeScan => "BARCODE_SCAN",
            AuditAction::MarkAlertRead => "MARK_ALERT_READ",
            AuditAction::ResolveAlert => "RESOLVE_ALERT",
            AuditAction::InitializeUserRole => "INITIALIZE_USER_ROLE",
            AuditAction::UpdateUserRole => "UPDATE_USER_ROLE",
            AuditAction::SeedSampleData => "SEED_SAMPLE_DATA",
        }
    }

    /// Entity type recorded alongside the action
    pub fn entity_type(&self) -> &'static str {
        match self {
            AuditAction::CreateCategory
            | AuditAction::UpdateCategory
            | AuditAction::DeleteCategory => "category",
            AuditAction::CreateSupplier
            | AuditAction::UpdateSupplier
            | AuditAction::DeleteSupplier => "supplier",
            AuditAction::CreateSupply
            | AuditAction::UpdateSupply
            | AuditAction::DeactivateSupply => "supply",
            AuditAction::StockMovement | AuditAction::BarcodeScan => "stock_movement",
            AuditAction::AddInventoryBatch | AuditAction::QuarantineBatch => "inventory_batch",
            AuditAction::MarkAlertRead | AuditAction::ResolveAlert => "alert",
            AuditAction::InitializeUserRole | AuditAction::UpdateUserRole => "user_role",
            AuditAction::SeedSampleData => "system",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
