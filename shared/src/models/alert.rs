//! Inventory alert models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Alert categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "alert_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    ExpiringSoon,
    Expired,
    ReorderNeeded,
    Anomaly,
}

/// Alert types that share one open-alert slot per supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertFamily {
    LowStock,
    /// `expiring_soon` and `expired`
    Expiration,
    Reorder,
    Anomaly,
}

impl AlertType {
    pub fn family(&self) -> AlertFamily {
        match self {
            AlertType::LowStock => AlertFamily::LowStock,
            AlertType::ExpiringSoon | AlertType::Expired => AlertFamily::Expiration,
            AlertType::ReorderNeeded => AlertFamily::Reorder,
            AlertType::Anomaly => AlertFamily::Anomaly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::LowStock => "low_stock",
            AlertType::ExpiringSoon => "expiring_soon",
            AlertType::Expired => "expired",
            AlertType::ReorderNeeded => "reorder_needed",
            AlertType::Anomaly => "anomaly",
        }
    }
}

/// Alert severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "alert_severity", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored alert
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Alert {
    pub id: Uuid,
    pub alert_type: AlertType,
    pub supply_id: Uuid,
    /// Batch that triggered an expiration alert, informational only
    pub batch_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub is_read: bool,
    pub is_resolved: bool,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// An alert to be inserted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertDraft {
    pub alert_type: AlertType,
    pub supply_id: Uuid,
    pub batch_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
}
