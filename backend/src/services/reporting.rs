//! Reporting service for the dashboard and data export
//! Provides stock overview, expiring batch reports and CSV export

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{days_until, expiring_batches, StockStatus, DEFAULT_EXPIRATION_WINDOW_DAYS};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{AlertWithSupply, ExpiringItem, MovementWithNames, ALERT_WITH_SUPPLY_COLUMNS};
use crate::services::inventory::InventoryService;
use crate::services::supply::{load_active_stock, SupplyStock};

const DASHBOARD_FEED_LIMIT: i64 = 10;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Stock overview across active supplies
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardOverview {
    pub total_supplies: i64,
    pub low_stock_count: i64,
    pub critical_stock_count: i64,
    pub total_value: Decimal,
    /// Supplies with a batch expiring within the default window
    pub expiring_items_count: i64,
}

/// Dashboard metrics
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub overview: DashboardOverview,
    pub recent_alerts: Vec<AlertWithSupply>,
    pub recent_movements: Vec<MovementWithNames>,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    #[serde(default = "default_days_ahead")]
    pub days_ahead: i64,
    pub format: Option<String>, // "json" or "csv"
}

fn default_days_ahead() -> i64 {
    DEFAULT_EXPIRATION_WINDOW_DAYS
}


impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get dashboard metrics
    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let now = Utc::now();
        let cutoff = now + Duration::days(DEFAULT_EXPIRATION_WINDOW_DAYS);

        let mut overview = DashboardOverview::default();
        for entry in load_active_stock(&self.db).await? {
            overview.total_supplies += 1;
            overview.total_value += entry.total_value();
            match entry.supply.stock_status(entry.current_stock()) {
                StockStatus::Critical => overview.critical_stock_count += 1,
                StockStatus::Low => overview.low_stock_count += 1,
                StockStatus::Normal => {}
            }
            if !expiring_batches(&entry.batches, cutoff).is_empty() {
                overview.expiring_items_count += 1;
            }
        }

        // Open, unread alerts
        let sql = format!(
            r#"
            SELECT {ALERT_WITH_SUPPLY_COLUMNS}
            FROM alerts a
            LEFT JOIN supplies s ON s.id = a.supply_id
            WHERE a.is_read = false AND a.is_resolved = false
            ORDER BY a.created_at DESC
            LIMIT $1
            "#
        );
        let recent_alerts = sqlx::query_as::<_, AlertWithSupply>(&sql)
        .bind(DASHBOARD_FEED_LIMIT)
        .fetch_all(&self.db)
        .await?;

        let recent_movements = InventoryService::new(self.db.clone())
            .list_movements(None, DASHBOARD_FEED_LIMIT)
            .await?;

        Ok(DashboardStats {
            overview,
            recent_alerts,
            recent_movements,
        })
    }

    /// Non-empty batches of active supplies expiring within `days_ahead`,
    /// soonest first. Already-expired batches are included.
    pub async fn expiring_items(&self, days_ahead: i64) -> AppResult<Vec<ExpiringItem>> {
        let now = Utc::now();
        let cutoff = now + Duration::days(days_ahead.clamp(0, 3650));

        let categories: HashMap<Uuid, String> =
            sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM categories")
                .fetch_all(&self.db)
                .await?
                .into_iter()
                .collect();

        let stock = load_active_stock(&self.db).await?;
        Ok(collect_expiring_items(&stock, &categories, cutoff, now))
    }

    /// Export data to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record).map_err(|e| {
                crate::error::AppError::Internal(format!("CSV serialization error: {}", e))
            })?;
        }
        let csv_data = String::from_utf8(wtr.into_inner().map_err(|e| {
            crate::error::AppError::Internal(format!("CSV writer error: {}", e))
        })?)
        .map_err(|e| crate::error::AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}

/// Expiring report rows for a stock snapshot.
///
/// Uses the same batch rule as the dashboard's expiring count, so a supply is
/// counted there exactly when it has rows here.
fn collect_expiring_items(
    stock: &[SupplyStock],
    categories: &HashMap<Uuid, String>,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<ExpiringItem> {
    let mut items: Vec<ExpiringItem> = stock
        .iter()
        .filter(|entry| entry.supply.is_active)
        .flat_map(|entry| {
            expiring_batches(&entry.batches, cutoff)
                .into_iter()
                .filter_map(move |batch| {
                    let expiration_date = batch.expiration_date?;
                    Some(ExpiringItem {
                        batch_id: batch.id,
                        batch_number: batch.batch_number.clone(),
                        supply_id: entry.supply.id,
                        supply_name: entry.supply.name.clone(),
                        category_name: categories
                            .get(&entry.supply.category_id)
                            .cloned()
                            .unwrap_or_else(|| "Unknown".to_string()),
                        quantity: batch.quantity,
                        location: batch.location.clone(),
                        expiration_date,
                        days_until_expiration: days_until(expiration_date, now),
                        is_expired: expiration_date < now,
                        value: batch.value(),
                    })
                })
        })
        .collect();
    items.sort_by_key(|item| item.expiration_date);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        sku: &'static str,
        quantity: i64,
    }

    #[test]
    fn test_export_to_csv_writes_header_and_rows() {
        let csv = ReportingService::export_to_csv(&[
            Row { sku: "GLV-100", quantity: 40 },
            Row { sku: "SYR-5ML", quantity: 0 },
        ])
        .unwrap();
        assert_eq!(csv, "sku,quantity\nGLV-100,40\nSYR-5ML,0\n");
    }

    fn snapshot(name: &str, is_active: bool, expiries: &[(i64, Option<i64>)]) -> SupplyStock {
        let now = Utc::now();
        let supply = crate::models::Supply {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            sku: name.to_uppercase(),
            barcode: None,
            category_id: Uuid::new_v4(),
            supplier_id: Uuid::new_v4(),
            unit_of_measure: "box".to_string(),
            unit_cost: Decimal::new(500, 2),
            minimum_stock: 10,
            maximum_stock: 100,
            reorder_point: 5,
            reorder_quantity: 20,
            is_controlled_substance: false,
            requires_refrigeration: false,
            shelf_life_days: None,
            is_active,
            created_at: now,
            updated_at: now,
        };
        let batches = expiries
            .iter()
            .map(|(quantity, days)| crate::models::InventoryBatch {
                id: Uuid::new_v4(),
                supply_id: supply.id,
                batch_number: format!("{name}-{quantity}"),
                quantity: *quantity,
                expiration_date: days.map(|d| now + Duration::days(d)),
                received_date: now,
                cost: Decimal::new(500, 2),
                location: "Main Storage".to_string(),
                is_quarantined: false,
                notes: None,
            })
            .collect();
        SupplyStock { supply, batches }
    }

    #[test]
    fn test_expiring_items_follow_dashboard_rule() {
        let now = Utc::now();
        let cutoff = now + Duration::days(30);
        let stock = vec![
            snapshot("Rapid Tests", true, &[(150, Some(12)), (40, Some(-2)), (0, Some(3))]),
            snapshot("Gauze", true, &[(800, Some(700)), (20, None)]),
            snapshot("Retired Masks", false, &[(60, Some(5))]),
        ];
        let categories = HashMap::from([(stock[0].supply.category_id, "Diagnostics".to_string())]);

        let items = collect_expiring_items(&stock, &categories, cutoff, now);

        let quantities: Vec<i64> = items.iter().map(|i| i.quantity).collect();
        assert_eq!(quantities, vec![40, 150]);
        assert!(items[0].is_expired);
        assert_eq!(items[0].category_name, "Diagnostics");
        assert_eq!(items[0].value, Decimal::new(20000, 2));

        let dashboard_count = stock
            .iter()
            .filter(|e| e.supply.is_active && !expiring_batches(&e.batches, cutoff).is_empty())
            .count();
        let mut reported: Vec<Uuid> = items.iter().map(|i| i.supply_id).collect();
        reported.dedup();
        assert_eq!(reported.len(), dashboard_count);
    }

    #[test]
    fn test_export_to_csv_empty() {
        let rows: Vec<Row> = Vec::new();
        assert_eq!(ReportingService::export_to_csv(&rows).unwrap(), "");
    }
}
