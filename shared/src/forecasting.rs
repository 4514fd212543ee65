//! Usage forecasting, reorder suggestions and anomaly detection

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    lead_time_days, AnalyticsPeriod, MovementType, StockMovement, StockStatus, Supplier, Supply,
    UsageAnalytics,
};
use crate::types::{calendar_day, USAGE_WINDOW_DAYS};

/// Extra days of cover on top of lead time before a reorder is suggested
pub const REORDER_TRIGGER_BUFFER_DAYS: i64 = 5;

/// Days of usage a suggested order should cover beyond lead time
pub const SAFETY_STOCK_DAYS: i64 = 14;

/// A day is anomalous when its usage exceeds this multiple of the average
pub const ANOMALY_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Critical,
    High,
    Medium,
}

impl Urgency {
    pub fn from_days_until_stockout(days: i64) -> Self {
        if days <= 3 {
            Urgency::Critical
        } else if days <= 7 {
            Urgency::High
        } else {
            Urgency::Medium
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Urgency::Critical => 3,
            Urgency::High => 2,
            Urgency::Medium => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Critical => "critical",
            Urgency::High => "high",
            Urgency::Medium => "medium",
        }
    }
}

/// Suggested purchase for a supply projected to run out within lead time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReorderSuggestion {
    pub supply_id: Uuid,
    pub supply_name: String,
    pub sku: String,
    pub current_stock: i64,
    /// Rounded to one decimal place
    pub average_daily_usage: f64,
    pub days_until_stockout: i64,
    pub lead_time_days: i32,
    pub suggested_quantity: i64,
    pub estimated_cost: Decimal,
    pub urgency: Urgency,
    pub reason: String,
}

/// Round to one decimal place
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Whole days until stock runs out at the given daily usage.
///
/// `None` when there is no usage to project from.
pub fn days_until_stockout(current_stock: i64, average_daily_usage: f64) -> Option<i64> {
    if average_daily_usage <= 0.0 {
        return None;
    }
    Some((current_stock as f64 / average_daily_usage).floor() as i64)
}

/// Mean of recorded daily usage rows, zero when there are none
pub fn mean_daily_usage(rows: &[UsageAnalytics]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let total: i64 = rows.iter().map(|r| r.quantity_used).sum();
    total as f64 / rows.len() as f64
}

/// Quantity to order so stock covers the lead time plus safety days
pub fn suggested_order_quantity(
    reorder_quantity: i64,
    average_daily_usage: f64,
    lead_time_days: i32,
) -> i64 {
    let cover_days = (i64::from(lead_time_days) + SAFETY_STOCK_DAYS) as f64;
    let projected = (average_daily_usage * cover_days).ceil() as i64;
    reorder_quantity.max(projected)
}

/// Build a reorder suggestion from trailing 30-day outbound usage.
///
/// Returns `None` for unused supplies and for supplies with enough cover.
pub fn reorder_suggestion(
    supply: &Supply,
    supplier: Option<&Supplier>,
    current_stock: i64,
    usage_last_30_days: i64,
) -> Option<ReorderSuggestion> {
    let average_daily_usage = usage_last_30_days as f64 / USAGE_WINDOW_DAYS as f64;
    let days = days_until_stockout(current_stock, average_daily_usage)?;
    let lead_time = lead_time_days(supplier);

    if days > i64::from(lead_time) + REORDER_TRIGGER_BUFFER_DAYS {
        return None;
    }

    let suggested_quantity =
        suggested_order_quantity(supply.reorder_quantity, average_daily_usage, lead_time);

    Some(ReorderSuggestion {
        supply_id: supply.id,
        supply_name: supply.name.clone(),
        sku: supply.sku.clone(),
        current_stock,
        average_daily_usage: round_one_decimal(average_daily_usage),
        days_until_stockout: days,
        lead_time_days: lead_time,
        suggested_quantity,
        estimated_cost: Decimal::from(suggested_quantity) * supply.unit_cost,
        urgency: Urgency::from_days_until_stockout(days),
        reason: format!(
            "Based on {} units used in last {} days ({:.1}/day average)",
            usage_last_30_days, USAGE_WINDOW_DAYS, average_daily_usage
        ),
    })
}

/// Order suggestions most urgent first, keeping input order within a tier
pub fn rank_suggestions(suggestions: &mut [ReorderSuggestion]) {
    suggestions.sort_by(|a, b| b.urgency.rank().cmp(&a.urgency.rank()));
}

/// A day of unusually high outbound usage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageAnomaly {
    #[serde(rename = "type")]
    pub anomaly_type: String,
    pub date: NaiveDate,
    pub value: i64,
    pub threshold: f64,
    pub message: String,
}

/// Flag days whose outbound usage exceeds twice the period average.
///
/// `outbound` holds `(created_at, quantity)` for each `out` movement in the
/// period. Results are sorted by date.
pub fn detect_usage_anomalies(
    outbound: &[(DateTime<Utc>, i64)],
    period_days: i64,
) -> Vec<UsageAnomaly> {
    if period_days <= 0 {
        return Vec::new();
    }

    let total: i64 = outbound.iter().map(|(_, q)| q).sum();
    let average = total as f64 / period_days as f64;
    if average <= 0.0 {
        return Vec::new();
    }
    let threshold = average * ANOMALY_MULTIPLIER;

    let mut daily: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for (at, quantity) in outbound {
        *daily.entry(calendar_day(*at)).or_insert(0) += quantity;
    }

    daily
        .into_iter()
        .filter(|(_, usage)| *usage as f64 > threshold)
        .map(|(date, usage)| {
            let pct = (usage as f64 / average - 1.0) * 100.0;
            UsageAnomaly {
                anomaly_type: "high_usage".to_string(),
                date,
                value: usage,
                threshold,
                message: format!(
                    "Unusually high usage detected on {}: {} units ({:.0}% above average)",
                    date.format("%Y-%m-%d"),
                    usage,
                    pct
                ),
            }
        })
        .collect()
}

/// Annualized turnover of dispensed units against inventory value.
///
/// Formatted with two decimals, or `"0"` when there is no inventory value.
pub fn turnover_rate(
    total_dispensed: i64,
    total_inventory_value: Decimal,
    period_days: i64,
) -> String {
    let value = total_inventory_value.to_f64().unwrap_or(0.0);
    if value <= 0.0 || period_days <= 0 {
        return "0".to_string();
    }
    let rate = total_dispensed as f64 / value * 365.0 / period_days as f64;
    format!("{rate:.2}")
}

/// Current stock position of one supply, as fed into period analytics
#[derive(Debug, Clone)]
pub struct StockPosition {
    pub supply: Supply,
    pub current_stock: i64,
    pub value: Decimal,
}

/// Aggregate inventory metrics over a trailing period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryAnalytics {
    pub period: AnalyticsPeriod,
    pub total_movements: i64,
    pub total_received: i64,
    pub total_dispensed: i64,
    pub total_inventory_value: Decimal,
    pub low_stock_items: i64,
    pub critical_stock_items: i64,
    pub average_daily_usage: i64,
    pub anomalies: Vec<UsageAnomaly>,
    pub turnover_rate: String,
}

/// Compute period analytics from the movements inside the period and the
/// stock positions of all active supplies.
pub fn inventory_analytics(
    period: AnalyticsPeriod,
    movements: &[StockMovement],
    positions: &[StockPosition],
) -> InventoryAnalytics {
    let period_days = period.days();

    let total_received: i64 = movements
        .iter()
        .filter(|m| m.movement_type == MovementType::In)
        .map(|m| m.quantity)
        .sum();
    let outbound: Vec<(DateTime<Utc>, i64)> = movements
        .iter()
        .filter(|m| m.movement_type.is_usage())
        .map(|m| (m.created_at, m.quantity))
        .collect();
    let total_dispensed: i64 = outbound.iter().map(|(_, q)| q).sum();

    let mut total_inventory_value = Decimal::ZERO;
    let mut low_stock_items = 0;
    let mut critical_stock_items = 0;
    for position in positions.iter().filter(|p| p.supply.is_active) {
        total_inventory_value += position.value;
        match position.supply.stock_status(position.current_stock) {
            StockStatus::Critical => critical_stock_items += 1,
            StockStatus::Low => low_stock_items += 1,
            StockStatus::Normal => {}
        }
    }

    let average_daily_usage = (total_dispensed as f64 / period_days as f64).round() as i64;

    InventoryAnalytics {
        period,
        total_movements: movements.len() as i64,
        total_received,
        total_dispensed,
        total_inventory_value,
        low_stock_items,
        critical_stock_items,
        average_daily_usage,
        anomalies: detect_usage_anomalies(&outbound, period_days),
        turnover_rate: turnover_rate(total_dispensed, total_inventory_value, period_days),
    }
}
