//! Supplier management service

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    AuditAction, Permission, Supplier, SupplierWithCount, DEFAULT_DELIVERY_DAYS,
    DEFAULT_PERFORMANCE_RATING,
};
use crate::services::audit;
use crate::services::identity::Actor;

#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub contact_email: String,
    #[validate(length(min = 3, max = 50))]
    pub contact_phone: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[validate(range(min = 1, max = 365))]
    pub average_delivery_time: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSupplierInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(length(min = 3, max = 50))]
    pub contact_phone: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub address: Option<String>,
    pub is_active: Option<bool>,
    pub performance_rating: Option<Decimal>,
    #[validate(range(min = 1, max = 365))]
    pub average_delivery_time: Option<i32>,
}

impl SupplierService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Active suppliers with their supply counts, sorted by name
    pub async fn list_suppliers(&self) -> AppResult<Vec<SupplierWithCount>> {
        let suppliers = sqlx::query_as::<_, SupplierWithCount>(
            r#"
            SELECT sp.id, sp.name, sp.contact_email, sp.contact_phone, sp.address,
                   sp.is_active, sp.performance_rating, sp.average_delivery_time, sp.created_at,
                   COUNT(s.id) AS supply_count
            FROM suppliers sp
            LEFT JOIN supplies s ON s.supplier_id = sp.id
            WHERE sp.is_active = true
            GROUP BY sp.id
            ORDER BY sp.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    pub async fn get_supplier(&self, supplier_id: Uuid) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = $1")
            .bind(supplier_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    pub async fn create_supplier(
        &self,
        actor: &Actor,
        input: CreateSupplierInput,
    ) -> AppResult<Supplier> {
        actor.require(Permission::CreateSuppliers)?;
        input.validate()?;

        let mut tx = self.db.begin().await?;

        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (
                name, contact_email, contact_phone, address, is_active,
                performance_rating, average_delivery_time
            )
            VALUES ($1, $2, $3, $4, true, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.contact_email)
        .bind(&input.contact_phone)
        .bind(&input.address)
        .bind(Decimal::from(DEFAULT_PERFORMANCE_RATING))
        .bind(input.average_delivery_time.unwrap_or(DEFAULT_DELIVERY_DAYS))
        .fetch_one(&mut *tx)
        .await?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::CreateSupplier,
            supplier.id,
            None,
            Some(audit::snapshot(&supplier)?),
        )
        .await?;

        tx.commit().await?;

        tracing::info!("Created supplier {} ({})", supplier.name, supplier.id);
        Ok(supplier)
    }

    pub async fn update_supplier(
        &self,
        actor: &Actor,
        supplier_id: Uuid,
        input: UpdateSupplierInput,
    ) -> AppResult<Supplier> {
        actor.require(Permission::UpdateSuppliers)?;
        input.validate()?;

        if let Some(rating) = input.performance_rating {
            if rating < Decimal::ZERO || rating > Decimal::from(5) {
                return Err(AppError::Validation {
                    field: "performance_rating".to_string(),
                    message: "Performance rating must be between 0 and 5".to_string(),
                });
            }
        }

        let existing = self.get_supplier(supplier_id).await?;

        let mut tx = self.db.begin().await?;

        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers
            SET name = COALESCE($1, name),
                contact_email = COALESCE($2, contact_email),
                contact_phone = COALESCE($3, contact_phone),
                address = COALESCE($4, address),
                is_active = COALESCE($5, is_active),
                performance_rating = COALESCE($6, performance_rating),
                average_delivery_time = COALESCE($7, average_delivery_time)
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.contact_email)
        .bind(&input.contact_phone)
        .bind(&input.address)
        .bind(input.is_active)
        .bind(input.performance_rating)
        .bind(input.average_delivery_time)
        .bind(supplier_id)
        .fetch_one(&mut *tx)
        .await?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::UpdateSupplier,
            supplier.id,
            Some(audit::snapshot(&existing)?),
            Some(audit::snapshot(&supplier)?),
        )
        .await?;

        tx.commit().await?;

        Ok(supplier)
    }

    /// Delete a supplier. Rejected while any supply references it.
    pub async fn delete_supplier(&self, actor: &Actor, supplier_id: Uuid) -> AppResult<()> {
        actor.require(Permission::DeleteSuppliers)?;

        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, Supplier>(
            "SELECT * FROM suppliers WHERE id = $1 FOR UPDATE",
        )
        .bind(supplier_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;

        let dependents = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM supplies WHERE supplier_id = $1",
        )
        .bind(supplier_id)
        .fetch_one(&mut *tx)
        .await?;

        shared::ensure_no_dependents("supplier", dependents)?;

        sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(supplier_id)
            .execute(&mut *tx)
            .await?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::DeleteSupplier,
            supplier_id,
            Some(audit::snapshot(&existing)?),
            None,
        )
        .await?;

        tx.commit().await?;

        tracing::info!("Deleted supplier {} ({})", existing.name, supplier_id);
        Ok(())
    }
}
