//! Alert generation rules
//!
//! Sweeps are planned here as pure functions over a snapshot of supplies,
//! batches and currently open alerts. The backend inserts whatever drafts
//! come back, so running a sweep twice against the same data creates
//! nothing the second time.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::{AlertDraft, AlertFamily, AlertSeverity, AlertType, InventoryBatch, Supply};
use crate::types::days_until;

/// Days before expiry at which an expiring batch is high severity
pub const EXPIRY_HIGH_SEVERITY_DAYS: i64 = 7;

/// Severity of a low-stock alert
pub fn low_stock_severity(current_stock: i64, reorder_point: i64) -> AlertSeverity {
    if current_stock <= 0 {
        AlertSeverity::Critical
    } else if current_stock * 2 <= reorder_point {
        AlertSeverity::High
    } else {
        AlertSeverity::Medium
    }
}

/// Severity of an expiration alert given the days remaining
pub fn expiration_severity(days_remaining: i64) -> AlertSeverity {
    if days_remaining < 0 {
        AlertSeverity::Critical
    } else if days_remaining <= EXPIRY_HIGH_SEVERITY_DAYS {
        AlertSeverity::High
    } else {
        AlertSeverity::Medium
    }
}

pub fn draft_low_stock_alert(supply: &Supply, current_stock: i64) -> AlertDraft {
    let (title, message) = if current_stock <= 0 {
        (
            "Out of Stock",
            format!(
                "{} is out of stock. Reorder point: {}",
                supply.name, supply.reorder_point
            ),
        )
    } else {
        (
            "Low Stock Alert",
            format!(
                "{} is low in stock ({} remaining). Reorder point: {}",
                supply.name, current_stock, supply.reorder_point
            ),
        )
    };

    AlertDraft {
        alert_type: AlertType::LowStock,
        supply_id: supply.id,
        batch_id: None,
        title: title.to_string(),
        message,
        severity: low_stock_severity(current_stock, supply.reorder_point),
    }
}

/// Draft an expiration alert for a batch. `None` when the batch never expires.
pub fn draft_expiration_alert(
    supply: &Supply,
    batch: &InventoryBatch,
    now: DateTime<Utc>,
) -> Option<AlertDraft> {
    let expiration = batch.expiration_date?;
    let days_remaining = days_until(expiration, now);
    let expired = days_remaining < 0;

    let (alert_type, title, message) = if expired {
        (
            AlertType::Expired,
            "Expired Items",
            format!(
                "{} batch {} has expired. Quantity: {}",
                supply.name, batch.batch_number, batch.quantity
            ),
        )
    } else {
        (
            AlertType::ExpiringSoon,
            "Items Expiring Soon",
            format!(
                "{} batch {} expires in {} days. Quantity: {}",
                supply.name, batch.batch_number, days_remaining, batch.quantity
            ),
        )
    };

    Some(AlertDraft {
        alert_type,
        supply_id: supply.id,
        batch_id: Some(batch.id),
        title: title.to_string(),
        message,
        severity: expiration_severity(days_remaining),
    })
}

pub fn draft_reorder_alert(supply: &Supply, current_stock: i64) -> AlertDraft {
    AlertDraft {
        alert_type: AlertType::ReorderNeeded,
        supply_id: supply.id,
        batch_id: None,
        title: "Reorder Required".to_string(),
        message: format!(
            "{} has reached reorder point. Current stock: {}",
            supply.name, current_stock
        ),
        severity: AlertSeverity::High,
    }
}

/// Open (unresolved) alerts keyed by supply and family
#[derive(Debug, Clone, Default)]
pub struct OpenAlertIndex(HashSet<(Uuid, AlertFamily)>);

impl OpenAlertIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, supply_id: Uuid, family: AlertFamily) -> bool {
        self.0.contains(&(supply_id, family))
    }

    /// Claim the slot for a new alert. Returns false if one is already open.
    pub fn claim(&mut self, supply_id: Uuid, family: AlertFamily) -> bool {
        self.0.insert((supply_id, family))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Uuid, AlertType)> for OpenAlertIndex {
    fn from_iter<I: IntoIterator<Item = (Uuid, AlertType)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(supply_id, alert_type)| (supply_id, alert_type.family()))
                .collect(),
        )
    }
}

/// Plan low-stock alerts for every active supply at or below its reorder point.
///
/// `stock_levels` pairs each supply with its current stock.
pub fn plan_low_stock_sweep(
    stock_levels: &[(Supply, i64)],
    open: &mut OpenAlertIndex,
) -> Vec<AlertDraft> {
    stock_levels
        .iter()
        .filter(|(supply, stock)| supply.is_active && *stock <= supply.reorder_point)
        .filter(|(supply, _)| open.claim(supply.id, AlertFamily::LowStock))
        .map(|(supply, stock)| draft_low_stock_alert(supply, *stock))
        .collect()
}

/// Plan expiration alerts for batches expiring within `window_days`.
///
/// One alert per supply: once a supply has an open expiration alert, or one
/// planned earlier in this sweep, its other batches are skipped. Batches are
/// visited earliest expiry first so the most urgent batch is the one reported.
pub fn plan_expiration_sweep(
    supplies: &[Supply],
    batches: &[InventoryBatch],
    now: DateTime<Utc>,
    window_days: i64,
    open: &mut OpenAlertIndex,
) -> Vec<AlertDraft> {
    let cutoff = now + Duration::days(window_days);
    let by_id: HashMap<Uuid, &Supply> = supplies.iter().map(|s| (s.id, s)).collect();

    let mut candidates: Vec<&InventoryBatch> = batches
        .iter()
        .filter(|b| b.quantity > 0 && b.expires_by(cutoff))
        .collect();
    candidates.sort_by_key(|b| b.expiration_date);

    let mut drafts = Vec::new();
    for batch in candidates {
        let Some(supply) = by_id.get(&batch.supply_id) else {
            continue;
        };
        if open.contains(supply.id, AlertFamily::Expiration) {
            continue;
        }
        if let Some(draft) = draft_expiration_alert(supply, batch, now) {
            open.claim(supply.id, AlertFamily::Expiration);
            drafts.push(draft);
        }
    }
    drafts
}

/// Reorder alert to raise after a movement leaves `new_stock` on hand, if any
pub fn plan_reorder_alert(
    supply: &Supply,
    new_stock: i64,
    open: &mut OpenAlertIndex,
) -> Option<AlertDraft> {
    if new_stock > supply.reorder_point {
        return None;
    }
    if !open.claim(supply.id, AlertFamily::Reorder) {
        return None;
    }
    Some(draft_reorder_alert(supply, new_stock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn supply(name: &str, reorder_point: i64) -> Supply {
        Supply {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            sku: "SKU-1".to_string(),
            barcode: None,
            category_id: Uuid::nil(),
            supplier_id: Uuid::nil(),
            unit_of_measure: "box".to_string(),
            unit_cost: Decimal::ONE,
            minimum_stock: reorder_point / 2,
            maximum_stock: reorder_point * 10,
            reorder_point,
            reorder_quantity: reorder_point,
            is_controlled_substance: false,
            requires_refrigeration: false,
            shelf_life_days: None,
            is_active: true,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn batch(supply: &Supply, number: &str, quantity: i64, expires_in: Duration) -> InventoryBatch {
        InventoryBatch {
            id: Uuid::new_v4(),
            supply_id: supply.id,
            batch_number: number.to_string(),
            quantity,
            expiration_date: Some(now() + expires_in),
            received_date: now() - Duration::days(60),
            cost: Decimal::ONE,
            location: "Pharmacy".to_string(),
            is_quarantined: false,
            notes: None,
        }
    }

    #[test]
    fn test_low_stock_severity_tiers() {
        assert_eq!(low_stock_severity(0, 2000), AlertSeverity::Critical);
        assert_eq!(low_stock_severity(900, 2000), AlertSeverity::High);
        assert_eq!(low_stock_severity(1000, 2000), AlertSeverity::High);
        assert_eq!(low_stock_severity(1800, 2000), AlertSeverity::Medium);
    }

    #[test]
    fn test_low_stock_messages() {
        let masks = supply("Surgical Masks", 2000);
        let out = draft_low_stock_alert(&masks, 0);
        assert_eq!(out.title, "Out of Stock");
        assert_eq!(out.message, "Surgical Masks is out of stock. Reorder point: 2000");

        let low = draft_low_stock_alert(&masks, 900);
        assert_eq!(low.title, "Low Stock Alert");
        assert_eq!(
            low.message,
            "Surgical Masks is low in stock (900 remaining). Reorder point: 2000"
        );
    }

    #[test]
    fn test_low_stock_sweep_is_idempotent() {
        let levels = vec![(supply("Gauze", 100), 10), (supply("Gloves", 100), 500)];
        let mut open = OpenAlertIndex::new();
        assert_eq!(plan_low_stock_sweep(&levels, &mut open).len(), 1);
        assert!(plan_low_stock_sweep(&levels, &mut open).is_empty());
    }

    #[test]
    fn test_low_stock_sweep_skips_inactive() {
        let mut retired = supply("Retired", 100);
        retired.is_active = false;
        let mut open = OpenAlertIndex::new();
        assert!(plan_low_stock_sweep(&[(retired, 0)], &mut open).is_empty());
    }

    #[test]
    fn test_expiration_alert_content() {
        let insulin = supply("Insulin", 10);
        let b = batch(&insulin, "INS-001", 25, Duration::days(5));
        let draft = draft_expiration_alert(&insulin, &b, now()).unwrap();
        assert_eq!(draft.alert_type, AlertType::ExpiringSoon);
        assert_eq!(draft.severity, AlertSeverity::High);
        assert_eq!(draft.message, "Insulin batch INS-001 expires in 5 days. Quantity: 25");

        let old = batch(&insulin, "INS-000", 3, Duration::days(-2));
        let draft = draft_expiration_alert(&insulin, &old, now()).unwrap();
        assert_eq!(draft.alert_type, AlertType::Expired);
        assert_eq!(draft.title, "Expired Items");
        assert_eq!(draft.severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_expiration_sweep_one_alert_per_supply() {
        let insulin = supply("Insulin", 10);
        let batches = vec![
            batch(&insulin, "LATE", 5, Duration::days(20)),
            batch(&insulin, "SOON", 5, Duration::days(3)),
        ];
        let mut open = OpenAlertIndex::new();
        let drafts = plan_expiration_sweep(&[insulin], &batches, now(), 30, &mut open);
        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].message.contains("SOON"));
    }

    #[test]
    fn test_expiration_sweep_ignores_empty_and_distant_batches() {
        let saline = supply("Saline", 10);
        let batches = vec![
            batch(&saline, "EMPTY", 0, Duration::days(2)),
            batch(&saline, "FAR", 10, Duration::days(45)),
        ];
        let mut open = OpenAlertIndex::new();
        assert!(plan_expiration_sweep(&[saline], &batches, now(), 30, &mut open).is_empty());
    }

    #[test]
    fn test_reorder_alert_dedup() {
        let gauze = supply("Gauze", 50);
        let mut open: OpenAlertIndex = vec![(gauze.id, AlertType::ReorderNeeded)]
            .into_iter()
            .collect();
        assert!(plan_reorder_alert(&gauze, 10, &mut open).is_none());

        let mut fresh = OpenAlertIndex::new();
        let draft = plan_reorder_alert(&gauze, 10, &mut fresh).unwrap();
        assert_eq!(draft.message, "Gauze has reached reorder point. Current stock: 10");
        assert!(plan_reorder_alert(&gauze, 60, &mut OpenAlertIndex::new()).is_none());
    }
}
