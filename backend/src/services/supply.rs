//! Supply catalog service
//!
//! Listing and detail views derive stock from batches on every read. The
//! snapshot loaders at the bottom are shared by the alert, analytics and
//! dashboard services.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use shared::{
    calendar_day, current_stock, days_until_stockout, expiring_summary, fefo_order,
    listing_order, mean_daily_usage, round_one_decimal, total_value, validate_stock_thresholds,
    TimeWindow, DEFAULT_EXPIRATION_WINDOW_DAYS, USAGE_WINDOW_DAYS,
};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{map_unique_violation, AppError, AppResult};
use crate::models::{
    AuditAction, Category, InventoryBatch, MovementWithNames, Permission, StockStatus, Supplier,
    Supply, UsageAnalytics,
};
use crate::services::audit;
use crate::services::identity::Actor;

#[derive(Clone)]
pub struct SupplyService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplyInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
    #[validate(custom = "shared::validate_sku")]
    pub sku: String,
    #[validate(custom = "shared::validate_barcode")]
    pub barcode: Option<String>,
    pub category_id: Uuid,
    pub supplier_id: Uuid,
    #[validate(length(min = 1, max = 50))]
    pub unit_of_measure: String,
    pub unit_cost: Decimal,
    pub minimum_stock: i64,
    pub maximum_stock: i64,
    pub reorder_point: i64,
    pub reorder_quantity: i64,
    #[serde(default)]
    pub is_controlled_substance: bool,
    #[serde(default)]
    pub requires_refrigeration: bool,
    #[validate(range(min = 1, max = 3650))]
    pub shelf_life_days: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSupplyInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(custom = "shared::validate_sku")]
    pub sku: Option<String>,
    /// Absent leaves the barcode alone, `null` clears it
    #[validate(custom = "shared::validate_barcode")]
    #[serde(default, deserialize_with = "present_or_null")]
    pub barcode: Option<Option<String>>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    #[validate(length(min = 1, max = 50))]
    pub unit_of_measure: Option<String>,
    pub unit_cost: Option<Decimal>,
    pub minimum_stock: Option<i64>,
    pub maximum_stock: Option<i64>,
    pub reorder_point: Option<i64>,
    pub reorder_quantity: Option<i64>,
    pub is_controlled_substance: Option<bool>,
    pub requires_refrigeration: Option<bool>,
    #[validate(range(min = 1, max = 3650))]
    pub shelf_life_days: Option<i32>,
}

/// Distinguishes an explicit `null` from a missing field
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// ILIKE pattern matching `term` anywhere, with wildcards in `term` taken literally
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Filters for the supply listing
#[derive(Debug, Default, Deserialize)]
pub struct SupplyFilter {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    #[serde(default)]
    pub low_stock_only: bool,
}

/// Supply row in the catalog listing
#[derive(Debug, Clone, Serialize)]
pub struct SupplyListItem {
    #[serde(flatten)]
    pub supply: Supply,
    pub current_stock: i64,
    pub stock_status: StockStatus,
    pub category_name: String,
    pub supplier_name: String,
    pub expiring_quantity: i64,
    pub next_expiration_date: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct SupplyListRow {
    #[sqlx(flatten)]
    supply: Supply,
    category_name: Option<String>,
    supplier_name: Option<String>,
}

/// Derived stock figures for a single supply
#[derive(Debug, Clone, Serialize)]
pub struct SupplyAnalytics {
    pub current_stock: i64,
    pub total_value: Decimal,
    pub average_daily_usage: f64,
    pub days_until_stockout: Option<i64>,
    pub stock_status: StockStatus,
}

/// Full detail view of a supply
#[derive(Debug, Clone, Serialize)]
pub struct SupplyDetails {
    pub supply: Supply,
    pub category: Option<Category>,
    pub supplier: Option<Supplier>,
    /// First-expiry-first-out order
    pub batches: Vec<InventoryBatch>,
    pub recent_movements: Vec<MovementWithNames>,
    pub analytics: SupplyAnalytics,
}

/// A supply together with its batches
#[derive(Debug, Clone)]
pub struct SupplyStock {
    pub supply: Supply,
    pub batches: Vec<InventoryBatch>,
}

impl SupplyStock {
    pub fn current_stock(&self) -> i64 {
        current_stock(&self.batches)
    }

    pub fn total_value(&self) -> Decimal {
        total_value(&self.batches)
    }
}

impl SupplyService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Active supplies with derived stock, most urgent first
    pub async fn list_supplies(&self, filter: SupplyFilter) -> AppResult<Vec<SupplyListItem>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(contains_pattern);

        let rows = sqlx::query_as::<_, SupplyListRow>(
            r#"
            SELECT s.*, c.name AS category_name, sp.name AS supplier_name
            FROM supplies s
            LEFT JOIN categories c ON c.id = s.category_id
            LEFT JOIN suppliers sp ON sp.id = s.supplier_id
            WHERE s.is_active = true
              AND ($1::uuid IS NULL OR s.category_id = $1)
              AND ($2::text IS NULL OR s.name ILIKE $2 ESCAPE '\')
            "#,
        )
        .bind(filter.category_id)
        .bind(search)
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.supply.id).collect();
        let mut batches = load_batches_for(&self.db, &ids).await?;
        let cutoff = Utc::now() + Duration::days(DEFAULT_EXPIRATION_WINDOW_DAYS);

        let mut items: Vec<SupplyListItem> = rows
            .into_iter()
            .map(|row| {
                let supply_batches = batches.remove(&row.supply.id).unwrap_or_default();
                let stock = current_stock(&supply_batches);
                let expiring = expiring_summary(&supply_batches, cutoff);
                SupplyListItem {
                    stock_status: row.supply.stock_status(stock),
                    current_stock: stock,
                    category_name: row.category_name.unwrap_or_else(|| "Unknown".to_string()),
                    supplier_name: row.supplier_name.unwrap_or_else(|| "Unknown".to_string()),
                    expiring_quantity: expiring.quantity,
                    next_expiration_date: expiring.next_expiration,
                    supply: row.supply,
                }
            })
            .filter(|item| !filter.low_stock_only || item.stock_status != StockStatus::Normal)
            .collect();

        items.sort_by(|a, b| {
            listing_order(
                (a.stock_status, a.supply.name.as_str()),
                (b.stock_status, b.supply.name.as_str()),
            )
        });

        Ok(items)
    }

    pub async fn get_supply_details(&self, supply_id: Uuid) -> AppResult<SupplyDetails> {
        let supply = fetch_supply(&self.db, supply_id).await?;

        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(supply.category_id)
            .fetch_optional(&self.db)
            .await?;

        let supplier = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = $1")
            .bind(supply.supplier_id)
            .fetch_optional(&self.db)
            .await?;

        let mut batches = sqlx::query_as::<_, InventoryBatch>(
            "SELECT * FROM inventory_batches WHERE supply_id = $1",
        )
        .bind(supply_id)
        .fetch_all(&self.db)
        .await?;
        fefo_order(&mut batches);

        let recent_movements = sqlx::query_as::<_, MovementWithNames>(
            r#"
            SELECT m.*, s.name AS supply_name, COALESCE(u.name, 'System') AS user_name
            FROM stock_movements m
            JOIN supplies s ON s.id = m.supply_id
            LEFT JOIN users u ON u.id = m.performed_by
            WHERE m.supply_id = $1
            ORDER BY m.created_at DESC
            LIMIT 20
            "#,
        )
        .bind(supply_id)
        .fetch_all(&self.db)
        .await?;

        let since = calendar_day(TimeWindow::trailing(Utc::now(), USAGE_WINDOW_DAYS).start);
        let usage = sqlx::query_as::<_, UsageAnalytics>(
            "SELECT * FROM usage_analytics WHERE supply_id = $1 AND date >= $2",
        )
        .bind(supply_id)
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        let stock = current_stock(&batches);
        let average = mean_daily_usage(&usage);
        let analytics = SupplyAnalytics {
            current_stock: stock,
            total_value: total_value(&batches),
            average_daily_usage: round_one_decimal(average),
            days_until_stockout: days_until_stockout(stock, average),
            stock_status: supply.stock_status(stock),
        };

        Ok(SupplyDetails {
            supply,
            category,
            supplier,
            batches,
            recent_movements,
            analytics,
        })
    }

    pub async fn create_supply(
        &self,
        actor: &Actor,
        input: CreateSupplyInput,
    ) -> AppResult<Supply> {
        actor.require(Permission::CreateSupplies)?;
        input.validate()?;
        validate_stock_thresholds(
            input.minimum_stock,
            input.maximum_stock,
            input.reorder_point,
            input.reorder_quantity,
        )?;
        ensure_non_negative_cost(input.unit_cost)?;

        self.ensure_references_exist(input.category_id, input.supplier_id)
            .await?;
        self.ensure_unique_codes(&input.sku, input.barcode.as_deref(), None)
            .await?;

        let mut tx = self.db.begin().await?;

        let supply = sqlx::query_as::<_, Supply>(
            r#"
            INSERT INTO supplies (
                name, description, sku, barcode, category_id, supplier_id, unit_of_measure,
                unit_cost, minimum_stock, maximum_stock, reorder_point, reorder_quantity,
                is_controlled_substance, requires_refrigeration, shelf_life_days, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, true)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.sku)
        .bind(input.barcode.is_some())
        .bind(input.barcode.as_ref().and_then(|b| b.as_deref()))
        .bind(input.category_id)
        .bind(input.supplier_id)
        .bind(&input.unit_of_measure)
        .bind(input.unit_cost)
        .bind(input.minimum_stock)
        .bind(input.maximum_stock)
        .bind(input.reorder_point)
        .bind(input.reorder_quantity)
        .bind(input.is_controlled_substance)
        .bind(input.requires_refrigeration)
        .bind(input.shelf_life_days)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, &["sku", "barcode"]))?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::CreateSupply,
            supply.id,
            None,
            Some(audit::snapshot(&supply)?),
        )
        .await?;

        tx.commit().await?;

        tracing::info!("Created supply {} ({}) sku={}", supply.name, supply.id, supply.sku);
        Ok(supply)
    }

    /// Partial update. Thresholds are validated after merging with stored values.
    pub async fn update_supply(
        &self,
        actor: &Actor,
        supply_id: Uuid,
        input: UpdateSupplyInput,
    ) -> AppResult<Supply> {
        actor.require(Permission::UpdateSupplies)?;
        input.validate()?;

        let existing = fetch_supply(&self.db, supply_id).await?;

        validate_stock_thresholds(
            input.minimum_stock.unwrap_or(existing.minimum_stock),
            input.maximum_stock.unwrap_or(existing.maximum_stock),
            input.reorder_point.unwrap_or(existing.reorder_point),
            input.reorder_quantity.unwrap_or(existing.reorder_quantity),
        )?;
        if let Some(cost) = input.unit_cost {
            ensure_non_negative_cost(cost)?;
        }

        if input.category_id.is_some() || input.supplier_id.is_some() {
            self.ensure_references_exist(
                input.category_id.unwrap_or(existing.category_id),
                input.supplier_id.unwrap_or(existing.supplier_id),
            )
            .await?;
        }
        self.ensure_unique_codes(
            input.sku.as_deref().unwrap_or(&existing.sku),
            input.barcode.as_ref().and_then(|b| b.as_deref()),
            Some(supply_id),
        )
        .await?;

        let mut tx = self.db.begin().await?;

        let supply = sqlx::query_as::<_, Supply>(
            r#"
            UPDATE supplies
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                sku = COALESCE($3, sku),
                barcode = CASE WHEN $4 THEN $5 ELSE barcode END,
                category_id = COALESCE($6, category_id),
                supplier_id = COALESCE($7, supplier_id),
                unit_of_measure = COALESCE($8, unit_of_measure),
                unit_cost = COALESCE($9, unit_cost),
                minimum_stock = COALESCE($10, minimum_stock),
                maximum_stock = COALESCE($11, maximum_stock),
                reorder_point = COALESCE($12, reorder_point),
                reorder_quantity = COALESCE($13, reorder_quantity),
                is_controlled_substance = COALESCE($14, is_controlled_substance),
                requires_refrigeration = COALESCE($15, requires_refrigeration),
                shelf_life_days = COALESCE($16, shelf_life_days),
                updated_at = NOW()
            WHERE id = $17
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.sku)
        .bind(&input.barcode)
        .bind(input.category_id)
        .bind(input.supplier_id)
        .bind(&input.unit_of_measure)
        .bind(input.unit_cost)
        .bind(input.minimum_stock)
        .bind(input.maximum_stock)
        .bind(input.reorder_point)
        .bind(input.reorder_quantity)
        .bind(input.is_controlled_substance)
        .bind(input.requires_refrigeration)
        .bind(input.shelf_life_days)
        .bind(supply_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, &["sku", "barcode"]))?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::UpdateSupply,
            supply.id,
            Some(audit::snapshot(&existing)?),
            Some(audit::snapshot(&supply)?),
        )
        .await?;

        tx.commit().await?;

        Ok(supply)
    }

    /// Soft delete: the supply disappears from listings and sweeps
    pub async fn deactivate_supply(&self, actor: &Actor, supply_id: Uuid) -> AppResult<Supply> {
        actor.require(Permission::DeleteSupplies)?;

        let mut tx = self.db.begin().await?;

        let supply = sqlx::query_as::<_, Supply>(
            r#"
            UPDATE supplies SET is_active = false, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(supply_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Supply".to_string()))?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::DeactivateSupply,
            supply.id,
            Some(serde_json::json!({ "is_active": true })),
            Some(serde_json::json!({ "is_active": false })),
        )
        .await?;

        tx.commit().await?;

        tracing::info!("Deactivated supply {} ({})", supply.name, supply.id);
        Ok(supply)
    }

    async fn ensure_references_exist(&self, category_id: Uuid, supplier_id: Uuid) -> AppResult<()> {
        let category_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)",
        )
        .bind(category_id)
        .fetch_one(&self.db)
        .await?;
        if !category_exists {
            return Err(AppError::NotFound("Category".to_string()));
        }

        let supplier_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)",
        )
        .bind(supplier_id)
        .fetch_one(&self.db)
        .await?;
        if !supplier_exists {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        Ok(())
    }

    async fn ensure_unique_codes(
        &self,
        sku: &str,
        barcode: Option<&str>,
        exclude_id: Option<Uuid>,
    ) -> AppResult<()> {
        let sku_taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM supplies WHERE sku = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(sku)
        .bind(exclude_id)
        .fetch_one(&self.db)
        .await?;
        if sku_taken {
            return Err(AppError::Conflict {
                resource: "sku".to_string(),
                message: "SKU already exists".to_string(),
            });
        }

        if let Some(barcode) = barcode {
            let barcode_taken = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM supplies WHERE barcode = $1 AND ($2::uuid IS NULL OR id <> $2)
                )
                "#,
            )
            .bind(barcode)
            .bind(exclude_id)
            .fetch_one(&self.db)
            .await?;
            if barcode_taken {
                return Err(AppError::Conflict {
                    resource: "barcode".to_string(),
                    message: "Barcode already exists".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn ensure_non_negative_cost(cost: Decimal) -> AppResult<()> {
    if cost < Decimal::ZERO {
        return Err(AppError::Validation {
            field: "unit_cost".to_string(),
            message: "Unit cost must not be negative".to_string(),
        });
    }
    Ok(())
}

pub async fn fetch_supply<'e, E>(executor: E, supply_id: Uuid) -> AppResult<Supply>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Supply>("SELECT * FROM supplies WHERE id = $1")
        .bind(supply_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Supply".to_string()))
}

/// Batches of the given supplies, grouped by supply
pub async fn load_batches_for<'e, E>(
    executor: E,
    supply_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<InventoryBatch>>>
where
    E: PgExecutor<'e>,
{
    let batches = sqlx::query_as::<_, InventoryBatch>(
        "SELECT * FROM inventory_batches WHERE supply_id = ANY($1)",
    )
    .bind(supply_ids)
    .fetch_all(executor)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<InventoryBatch>> = HashMap::new();
    for batch in batches {
        grouped.entry(batch.supply_id).or_default().push(batch);
    }
    Ok(grouped)
}

/// Every active supply with its batches
pub async fn load_active_stock(db: &PgPool) -> AppResult<Vec<SupplyStock>> {
    let supplies = sqlx::query_as::<_, Supply>(
        "SELECT * FROM supplies WHERE is_active = true ORDER BY name",
    )
    .fetch_all(db)
    .await?;

    let ids: Vec<Uuid> = supplies.iter().map(|s| s.id).collect();
    let mut batches = load_batches_for(db, &ids).await?;

    Ok(supplies
        .into_iter()
        .map(|supply| SupplyStock {
            batches: batches.remove(&supply.id).unwrap_or_default(),
            supply,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_wildcards_match_literally() {
        assert_eq!(contains_pattern("gauze"), "%gauze%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("IV_set"), "%IV\\_set%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_update_barcode_missing_null_or_set() {
        let untouched: UpdateSupplyInput = serde_json::from_str(r#"{"name":"Gauze"}"#).unwrap();
        assert_eq!(untouched.barcode, None);

        let cleared: UpdateSupplyInput = serde_json::from_str(r#"{"barcode":null}"#).unwrap();
        assert_eq!(cleared.barcode, Some(None));
        assert!(cleared.validate().is_ok());

        let set: UpdateSupplyInput =
            serde_json::from_str(r#"{"barcode":"123456789012"}"#).unwrap();
        assert_eq!(set.barcode, Some(Some("123456789012".to_string())));
        assert!(set.validate().is_ok());

        let bad: UpdateSupplyInput = serde_json::from_str(r#"{"barcode":"12ab"}"#).unwrap();
        assert!(bad.validate().is_err());
    }
}
