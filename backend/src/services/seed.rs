//! Demo catalog for local runs
//!
//! Seeds categories, suppliers, supplies with batches, a few dispenses and a
//! month of usage history. Runs at most once: any existing category means the
//! database already holds data and nothing is written.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{AuditAction, Permission};
use crate::services::audit;
use crate::services::identity::Actor;

/// Advisory lock key serializing concurrent seed requests
const SEED_LOCK_KEY: i64 = 0x4d53_5345_4544_0000;

/// Days of usage history written per supply
const USAGE_HISTORY_DAYS: i64 = 30;

struct SampleCategory {
    name: &'static str,
    description: &'static str,
    color: &'static str,
}

struct SampleSupplier {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    address: &'static str,
    /// Tenths of a point
    rating: i64,
    delivery_days: i32,
}

struct SampleSupply {
    name: &'static str,
    description: &'static str,
    category: usize,
    supplier: usize,
    sku: &'static str,
    barcode: &'static str,
    unit: &'static str,
    unit_cost_cents: i64,
    minimum_stock: i64,
    maximum_stock: i64,
    reorder_point: i64,
    reorder_quantity: i64,
    requires_refrigeration: bool,
    shelf_life_days: i32,
    daily_usage: i64,
}

struct SampleBatch {
    supply: usize,
    batch_number: &'static str,
    quantity: i64,
    expires_in_days: i64,
    received_days_ago: i64,
    cost_cents: i64,
    location: &'static str,
    notes: &'static str,
}

struct SampleDispense {
    supply: usize,
    quantity: i64,
    previous_quantity: i64,
    reason: &'static str,
    location: &'static str,
    notes: &'static str,
}

const CATEGORIES: [SampleCategory; 5] = [
    SampleCategory {
        name: "Medications",
        description: "Pharmaceutical drugs and medicines",
        color: "#3B82F6",
    },
    SampleCategory {
        name: "Medical Devices",
        description: "Medical equipment and devices",
        color: "#10B981",
    },
    SampleCategory {
        name: "Surgical Supplies",
        description: "Surgical instruments and supplies",
        color: "#F59E0B",
    },
    SampleCategory {
        name: "Personal Protective Equipment",
        description: "PPE and safety equipment",
        color: "#EF4444",
    },
    SampleCategory {
        name: "Diagnostic Supplies",
        description: "Testing and diagnostic materials",
        color: "#8B5CF6",
    },
];

const SUPPLIERS: [SampleSupplier; 3] = [
    SampleSupplier {
        name: "MedSupply Corp",
        email: "orders@medsupply.com",
        phone: "+1-555-0101",
        address: "123 Medical Way, Healthcare City, HC 12345",
        rating: 45,
        delivery_days: 3,
    },
    SampleSupplier {
        name: "HealthTech Solutions",
        email: "sales@healthtech.com",
        phone: "+1-555-0102",
        address: "456 Innovation Blvd, Tech Valley, TV 67890",
        rating: 42,
        delivery_days: 5,
    },
    SampleSupplier {
        name: "Global Medical Supplies",
        email: "info@globalmed.com",
        phone: "+1-555-0103",
        address: "789 Supply Chain Dr, Distribution Hub, DH 54321",
        rating: 40,
        delivery_days: 7,
    },
];

const SUPPLIES: [SampleSupply; 6] = [
    SampleSupply {
        name: "Surgical Masks",
        description: "Disposable 3-layer surgical masks for medical procedures",
        category: 3,
        supplier: 0,
        sku: "SM-001",
        barcode: "123456789012",
        unit: "pieces",
        unit_cost_cents: 25,
        minimum_stock: 1000,
        maximum_stock: 10000,
        reorder_point: 2000,
        reorder_quantity: 5000,
        requires_refrigeration: false,
        shelf_life_days: 1095,
        daily_usage: 50,
    },
    SampleSupply {
        name: "Nitrile Gloves",
        description: "Powder-free nitrile examination gloves",
        category: 3,
        supplier: 0,
        sku: "NG-001",
        barcode: "234567890123",
        unit: "pieces",
        unit_cost_cents: 15,
        minimum_stock: 2000,
        maximum_stock: 20000,
        reorder_point: 3000,
        reorder_quantity: 10000,
        requires_refrigeration: false,
        shelf_life_days: 1825,
        daily_usage: 100,
    },
    SampleSupply {
        name: "Syringes 10ml",
        description: "Sterile disposable syringes 10ml with needle",
        category: 1,
        supplier: 1,
        sku: "SY-010",
        barcode: "345678901234",
        unit: "pieces",
        unit_cost_cents: 75,
        minimum_stock: 500,
        maximum_stock: 5000,
        reorder_point: 800,
        reorder_quantity: 2000,
        requires_refrigeration: false,
        shelf_life_days: 1825,
        daily_usage: 20,
    },
    SampleSupply {
        name: "Gauze Pads 4x4",
        description: "Sterile gauze pads for wound care",
        category: 2,
        supplier: 2,
        sku: "GP-44",
        barcode: "456789012345",
        unit: "pieces",
        unit_cost_cents: 50,
        minimum_stock: 1000,
        maximum_stock: 8000,
        reorder_point: 1500,
        reorder_quantity: 3000,
        requires_refrigeration: false,
        shelf_life_days: 1095,
        daily_usage: 30,
    },
    SampleSupply {
        name: "Ibuprofen 200mg",
        description: "Pain relief medication, 200mg tablets",
        category: 0,
        supplier: 1,
        sku: "IB-200",
        barcode: "567890123456",
        unit: "tablets",
        unit_cost_cents: 5,
        minimum_stock: 5000,
        maximum_stock: 50000,
        reorder_point: 8000,
        reorder_quantity: 20000,
        requires_refrigeration: false,
        shelf_life_days: 1095,
        daily_usage: 200,
    },
    SampleSupply {
        name: "COVID-19 Rapid Test",
        description: "Rapid antigen test for COVID-19 detection",
        category: 4,
        supplier: 0,
        sku: "CV-RT",
        barcode: "678901234567",
        unit: "tests",
        unit_cost_cents: 1250,
        minimum_stock: 100,
        maximum_stock: 1000,
        reorder_point: 200,
        reorder_quantity: 500,
        requires_refrigeration: true,
        shelf_life_days: 730,
        daily_usage: 5,
    },
];

const BATCHES: [SampleBatch; 7] = [
    SampleBatch {
        supply: 0,
        batch_number: "SM001-2024-01",
        quantity: 3000,
        expires_in_days: 365,
        received_days_ago: 30,
        cost_cents: 25,
        location: "Main Storage",
        notes: "Regular stock replenishment",
    },
    SampleBatch {
        supply: 0,
        batch_number: "SM001-2024-02",
        quantity: 2000,
        expires_in_days: 400,
        received_days_ago: 15,
        cost_cents: 23,
        location: "Main Storage",
        notes: "Bulk purchase discount",
    },
    SampleBatch {
        supply: 1,
        batch_number: "NG001-2024-01",
        quantity: 8000,
        expires_in_days: 730,
        received_days_ago: 45,
        cost_cents: 15,
        location: "Main Storage",
        notes: "Large batch order",
    },
    SampleBatch {
        supply: 2,
        batch_number: "SY010-2024-01",
        quantity: 1200,
        expires_in_days: 1095,
        received_days_ago: 20,
        cost_cents: 75,
        location: "Pharmacy",
        notes: "Standard restock",
    },
    SampleBatch {
        supply: 3,
        batch_number: "GP44-2024-01",
        quantity: 800,
        expires_in_days: 730,
        received_days_ago: 60,
        cost_cents: 50,
        location: "Surgery Ward",
        notes: "Running low - needs reorder",
    },
    SampleBatch {
        supply: 4,
        batch_number: "IB200-2024-01",
        quantity: 15000,
        expires_in_days: 730,
        received_days_ago: 10,
        cost_cents: 5,
        location: "Pharmacy",
        notes: "Fresh stock",
    },
    SampleBatch {
        supply: 5,
        batch_number: "CVRT-2024-01",
        quantity: 150,
        expires_in_days: 30,
        received_days_ago: 90,
        cost_cents: 1250,
        location: "Cold Storage",
        notes: "Expiring soon - use first",
    },
];

const DISPENSES: [SampleDispense; 3] = [
    SampleDispense {
        supply: 0,
        quantity: 200,
        previous_quantity: 5200,
        reason: "Daily ward usage",
        location: "Ward A",
        notes: "Regular consumption",
    },
    SampleDispense {
        supply: 1,
        quantity: 500,
        previous_quantity: 8500,
        reason: "Emergency department usage",
        location: "Emergency",
        notes: "High usage day",
    },
    SampleDispense {
        supply: 2,
        quantity: 50,
        previous_quantity: 1250,
        reason: "Vaccination clinic",
        location: "Clinic",
        notes: "Routine vaccinations",
    },
];

/// Outcome of a seed request
#[derive(Debug, Clone, Serialize)]
pub struct SampleDataReport {
    pub created: bool,
    pub message: String,
}

/// Units used `days_ago` days back: 75% to 125% of the daily figure, varied
/// per supply and day so the history is not flat
fn sample_usage(daily_usage: i64, supply: usize, days_ago: i64) -> i64 {
    let percent = 75 + (days_ago * 7 + supply as i64 * 13) % 51;
    daily_usage * percent / 100
}

#[derive(Clone)]
pub struct SeedService {
    db: PgPool,
}

impl SeedService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Load the demo catalog into an empty database
    pub async fn initialize_sample_data(&self, actor: &Actor) -> AppResult<SampleDataReport> {
        actor.require(Permission::SystemSettings)?;

        let mut tx = self.db.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SEED_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let populated =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories)")
                .fetch_one(&mut *tx)
                .await?;
        if populated {
            return Ok(SampleDataReport {
                created: false,
                message: "Sample data already exists".to_string(),
            });
        }

        let supply_ids = insert_catalog(&mut tx, actor.user_id()).await?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::SeedSampleData,
            Uuid::nil(),
            None,
            Some(serde_json::json!({
                "categories": CATEGORIES.len(),
                "suppliers": SUPPLIERS.len(),
                "supplies": supply_ids.len(),
                "batches": BATCHES.len(),
            })),
        )
        .await?;

        tx.commit().await?;

        tracing::info!("Seeded sample data with {} supplies", supply_ids.len());
        Ok(SampleDataReport {
            created: true,
            message: "Sample data initialized successfully".to_string(),
        })
    }
}

async fn insert_catalog(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Vec<Uuid>> {
    let now = Utc::now();

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for category in &CATEGORIES {
        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO categories (name, description, color) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(category.name)
        .bind(category.description)
        .bind(category.color)
        .fetch_one(&mut *conn)
        .await?;
        category_ids.push(id);
    }

    let mut supplier_ids = Vec::with_capacity(SUPPLIERS.len());
    for supplier in &SUPPLIERS {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO suppliers (
                name, contact_email, contact_phone, address,
                performance_rating, average_delivery_time
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(supplier.name)
        .bind(supplier.email)
        .bind(supplier.phone)
        .bind(supplier.address)
        .bind(Decimal::new(supplier.rating, 1))
        .bind(supplier.delivery_days)
        .fetch_one(&mut *conn)
        .await?;
        supplier_ids.push(id);
    }

    let mut supply_ids = Vec::with_capacity(SUPPLIES.len());
    for supply in &SUPPLIES {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO supplies (
                name, description, sku, barcode, category_id, supplier_id,
                unit_of_measure, unit_cost, minimum_stock, maximum_stock,
                reorder_point, reorder_quantity, requires_refrigeration, shelf_life_days
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            "#,
        )
        .bind(supply.name)
        .bind(supply.description)
        .bind(supply.sku)
        .bind(supply.barcode)
        .bind(category_ids[supply.category])
        .bind(supplier_ids[supply.supplier])
        .bind(supply.unit)
        .bind(Decimal::new(supply.unit_cost_cents, 2))
        .bind(supply.minimum_stock)
        .bind(supply.maximum_stock)
        .bind(supply.reorder_point)
        .bind(supply.reorder_quantity)
        .bind(supply.requires_refrigeration)
        .bind(supply.shelf_life_days)
        .fetch_one(&mut *conn)
        .await?;
        supply_ids.push(id);
    }

    for batch in &BATCHES {
        sqlx::query(
            r#"
            INSERT INTO inventory_batches (
                supply_id, batch_number, quantity, expiration_date, received_date,
                cost, location, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(supply_ids[batch.supply])
        .bind(batch.batch_number)
        .bind(batch.quantity)
        .bind(now + Duration::days(batch.expires_in_days))
        .bind(now - Duration::days(batch.received_days_ago))
        .bind(Decimal::new(batch.cost_cents, 2))
        .bind(batch.location)
        .bind(batch.notes)
        .execute(&mut *conn)
        .await?;
    }

    for dispense in &DISPENSES {
        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                supply_id, movement_type, quantity, previous_quantity, new_quantity,
                reason, performed_by, location, notes
            )
            VALUES ($1, 'out', $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(supply_ids[dispense.supply])
        .bind(dispense.quantity)
        .bind(dispense.previous_quantity)
        .bind(dispense.previous_quantity - dispense.quantity)
        .bind(dispense.reason)
        .bind(user_id)
        .bind(dispense.location)
        .bind(dispense.notes)
        .execute(&mut *conn)
        .await?;
    }

    for days_ago in 0..USAGE_HISTORY_DAYS {
        let date = (now - Duration::days(days_ago)).date_naive();
        for (index, supply) in SUPPLIES.iter().enumerate() {
            sqlx::query(
                "INSERT INTO usage_analytics (supply_id, date, quantity_used) VALUES ($1, $2, $3)",
            )
            .bind(supply_ids[index])
            .bind(date)
            .bind(sample_usage(supply.daily_usage, index, days_ago))
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(supply_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{current_stock, validate_stock_thresholds, InventoryBatch};

    fn seeded_stock(supply: usize) -> i64 {
        let batches: Vec<InventoryBatch> = BATCHES
            .iter()
            .filter(|b| b.supply == supply)
            .map(|b| InventoryBatch {
                id: Uuid::new_v4(),
                supply_id: Uuid::nil(),
                batch_number: b.batch_number.to_string(),
                quantity: b.quantity,
                expiration_date: None,
                received_date: Utc::now(),
                cost: Decimal::new(b.cost_cents, 2),
                location: b.location.to_string(),
                is_quarantined: false,
                notes: None,
            })
            .collect();
        current_stock(&batches)
    }

    #[test]
    fn test_catalog_passes_validation() {
        for category in &CATEGORIES {
            assert!(shared::validate_color(category.color).is_ok(), "{}", category.name);
        }
        for supply in &SUPPLIES {
            assert!(shared::validate_sku(supply.sku).is_ok(), "{}", supply.sku);
            assert!(shared::validate_barcode(supply.barcode).is_ok(), "{}", supply.sku);
            assert!(validate_stock_thresholds(
                supply.minimum_stock,
                supply.maximum_stock,
                supply.reorder_point,
                supply.reorder_quantity,
            )
            .is_ok());
            assert!(supply.category < CATEGORIES.len());
            assert!(supply.supplier < SUPPLIERS.len());
        }
        assert!(BATCHES.iter().all(|b| b.supply < SUPPLIES.len()));
    }

    #[test]
    fn test_masks_thresholds() {
        let masks = &SUPPLIES[0];
        assert_eq!(masks.sku, "SM-001");
        assert_eq!(masks.minimum_stock, 1000);
        assert_eq!(masks.reorder_point, 2000);
        assert_eq!(seeded_stock(0), 5000);
    }

    #[test]
    fn test_gauze_and_rapid_tests_start_below_reorder_point() {
        let low: Vec<&str> = SUPPLIES
            .iter()
            .enumerate()
            .filter(|(i, s)| seeded_stock(*i) <= s.reorder_point)
            .map(|(_, s)| s.sku)
            .collect();
        assert_eq!(low, vec!["GP-44", "CV-RT"]);
    }

    #[test]
    fn test_dispenses_end_at_seeded_stock() {
        for dispense in &DISPENSES {
            let after = dispense.previous_quantity - dispense.quantity;
            assert_eq!(after, seeded_stock(dispense.supply));
        }
    }

    #[test]
    fn test_sample_usage_stays_within_quarter_of_daily() {
        for (index, supply) in SUPPLIES.iter().enumerate() {
            for days_ago in 0..USAGE_HISTORY_DAYS {
                let used = sample_usage(supply.daily_usage, index, days_ago);
                assert!(used >= supply.daily_usage * 75 / 100);
                assert!(used <= supply.daily_usage * 125 / 100);
                assert!(used > 0);
            }
        }
    }
}
