//! Analytics service: inventory analytics, reorder suggestions and usage trends

use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde::Deserialize;
use shared::{
    inventory_analytics, rank_suggestions, reorder_suggestion, AnalyticsPeriod,
    InventoryAnalytics, ReorderSuggestion, StockPosition, TimeWindow, USAGE_WINDOW_DAYS,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{StockMovement, Supplier, UsageTrendPoint};
use crate::services::supply::load_active_stock;

#[derive(Clone)]
pub struct AnalyticsService {
    db: PgPool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsageTrendQuery {
    pub supply_id: Option<Uuid>,
    #[serde(default = "default_trend_days")]
    pub days: i64,
}

fn default_trend_days() -> i64 {
    USAGE_WINDOW_DAYS
}

impl AnalyticsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Movement aggregates, stock health and anomalies over the trailing period
    pub async fn inventory_analytics(
        &self,
        period: AnalyticsPeriod,
    ) -> AppResult<InventoryAnalytics> {
        let since = Utc::now() - Duration::days(period.days());

        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE created_at >= $1 ORDER BY created_at",
        )
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        let positions: Vec<StockPosition> = load_active_stock(&self.db)
            .await?
            .into_iter()
            .map(|s| StockPosition {
                current_stock: s.current_stock(),
                value: s.total_value(),
                supply: s.supply,
            })
            .collect();

        Ok(inventory_analytics(period, &movements, &positions))
    }

    /// Purchase suggestions for supplies projected to run out within lead time,
    /// most urgent first
    pub async fn reorder_suggestions(&self) -> AppResult<Vec<ReorderSuggestion>> {
        let window = TimeWindow::trailing(Utc::now(), USAGE_WINDOW_DAYS);

        let usage: HashMap<Uuid, i64> = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT supply_id, SUM(quantity)::BIGINT
            FROM stock_movements
            WHERE movement_type = 'out' AND created_at >= $1 AND created_at < $2
            GROUP BY supply_id
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .collect();

        let suppliers: HashMap<Uuid, Supplier> =
            sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers")
                .fetch_all(&self.db)
                .await?
                .into_iter()
                .map(|s| (s.id, s))
                .collect();

        let mut suggestions: Vec<ReorderSuggestion> = load_active_stock(&self.db)
            .await?
            .iter()
            .filter_map(|entry| {
                let used = usage.get(&entry.supply.id).copied().unwrap_or(0);
                let supplier = suppliers.get(&entry.supply.supplier_id);
                reorder_suggestion(&entry.supply, supplier, entry.current_stock(), used)
            })
            .collect();

        rank_suggestions(&mut suggestions);

        tracing::debug!("Computed {} reorder suggestions", suggestions.len());
        Ok(suggestions)
    }

    /// Daily usage totals, oldest first
    pub async fn usage_trends(&self, query: UsageTrendQuery) -> AppResult<Vec<UsageTrendPoint>> {
        let since = (Utc::now() - Duration::days(query.days.clamp(1, 365))).date_naive();

        let points = sqlx::query_as::<_, UsageTrendPoint>(
            r#"
            SELECT date, SUM(quantity_used)::BIGINT AS quantity_used
            FROM usage_analytics
            WHERE date >= $1 AND ($2::uuid IS NULL OR supply_id = $2)
            GROUP BY date
            ORDER BY date ASC
            "#,
        )
        .bind(since)
        .bind(query.supply_id)
        .fetch_all(&self.db)
        .await?;

        Ok(points)
    }
}
