//! Usage analytics models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Units consumed of one supply on one UTC calendar day
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UsageAnalytics {
    pub supply_id: Uuid,
    pub date: NaiveDate,
    pub quantity_used: i64,
}

/// Reporting period for inventory analytics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsPeriod {
    Week,
    #[default]
    Month,
    Quarter,
}

impl AnalyticsPeriod {
    pub fn days(&self) -> i64 {
        match self {
            AnalyticsPeriod::Week => 7,
            AnalyticsPeriod::Month => 30,
            AnalyticsPeriod::Quarter => 90,
        }
    }
}

/// Total usage on one day, across one or all supplies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UsageTrendPoint {
    pub date: NaiveDate,
    pub quantity_used: i64,
}
