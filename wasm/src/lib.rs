//! WebAssembly module for the Medical Supply Inventory Platform
//!
//! Provides client-side computation for:
//! - Stock status and low-stock severity badges
//! - FEFO dispense previews
//! - Stockout and reorder estimates
//! - Offline field validation

use chrono::{DateTime, TimeZone, Utc};
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Stock status for a level against its thresholds: "critical", "low" or "normal"
#[wasm_bindgen]
pub fn classify_stock_status(current_stock: f64, minimum_stock: f64, reorder_point: f64) -> String {
    let thresholds = StockThresholds {
        minimum_stock: minimum_stock as i64,
        reorder_point: reorder_point as i64,
    };
    classify_stock(current_stock as i64, &thresholds).to_string()
}

/// Severity a low-stock alert would carry at this level
#[wasm_bindgen]
pub fn low_stock_alert_severity(current_stock: f64, reorder_point: f64) -> String {
    shared::low_stock_severity(current_stock as i64, reorder_point as i64).to_string()
}

/// Whole days until stock runs out, or `undefined` without usage
#[wasm_bindgen]
pub fn estimate_days_until_stockout(current_stock: f64, average_daily_usage: f64) -> Option<f64> {
    shared::days_until_stockout(current_stock as i64, average_daily_usage).map(|d| d as f64)
}

/// Suggested order quantity covering lead time plus safety stock
#[wasm_bindgen]
pub fn estimate_order_quantity(
    reorder_quantity: f64,
    average_daily_usage: f64,
    lead_time_days: i32,
) -> f64 {
    shared::suggested_order_quantity(reorder_quantity as i64, average_daily_usage, lead_time_days)
        as f64
}

/// Preview how a dispense of `quantity` would be drawn from batches.
///
/// Takes the batches as JSON and returns the FEFO plan as JSON.
#[wasm_bindgen]
pub fn preview_fefo_draw(batches_json: &str, quantity: f64) -> Result<String, JsValue> {
    let batches: Vec<InventoryBatch> = serde_json::from_str(batches_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid batches JSON: {}", e)))?;

    let plan = shared::plan_fefo_draw(&batches, quantity as i64);
    if !plan.is_complete() {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "FEFO preview short by {} units",
            plan.unallocated
        )));
    }

    serde_json::to_string(&plan)
        .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
}

/// Days until an RFC 3339 expiration date, using the browser clock
#[wasm_bindgen]
pub fn days_until_expiration(expiration: &str) -> Result<f64, JsValue> {
    let now = Utc
        .timestamp_millis_opt(js_sys::Date::now() as i64)
        .single()
        .ok_or_else(|| JsValue::from_str("Invalid browser clock"))?;
    days_until_expiration_at(expiration, now)
        .map(|d| d as f64)
        .map_err(|e| JsValue::from_str(&e))
}

fn days_until_expiration_at(expiration: &str, now: DateTime<Utc>) -> Result<i64, String> {
    let at = DateTime::parse_from_rfc3339(expiration)
        .map_err(|e| format!("Invalid expiration date: {}", e))?
        .with_timezone(&Utc);
    Ok(days_until(at, now))
}

/// Validate a SKU before submitting it
#[wasm_bindgen]
pub fn is_valid_sku(sku: &str) -> bool {
    validate_sku(sku).is_ok()
}

/// Validate a scanned barcode before looking it up
#[wasm_bindgen]
pub fn is_valid_barcode(barcode: &str) -> bool {
    validate_barcode(barcode).is_ok()
}
