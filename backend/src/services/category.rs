//! Category management service

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{AuditAction, Category, CategoryWithCount, Permission};
use crate::services::audit;
use crate::services::identity::Actor;

#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,
    #[validate(custom = "shared::validate_color")]
    pub color: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(custom = "shared::validate_color")]
    pub color: Option<String>,
}

impl CategoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All categories with their supply counts, sorted by name
    pub async fn list_categories(&self) -> AppResult<Vec<CategoryWithCount>> {
        let categories = sqlx::query_as::<_, CategoryWithCount>(
            r#"
            SELECT c.id, c.name, c.description, c.color, c.created_at,
                   COUNT(s.id) AS supply_count
            FROM categories c
            LEFT JOIN supplies s ON s.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    pub async fn get_category(&self, category_id: Uuid) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(category_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Category".to_string()))
    }

    pub async fn create_category(
        &self,
        actor: &Actor,
        input: CreateCategoryInput,
    ) -> AppResult<Category> {
        actor.require(Permission::CreateCategories)?;
        input.validate()?;

        let mut tx = self.db.begin().await?;

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description, color)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.color)
        .fetch_one(&mut *tx)
        .await?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::CreateCategory,
            category.id,
            None,
            Some(audit::snapshot(&category)?),
        )
        .await?;

        tx.commit().await?;

        tracing::info!("Created category {} ({})", category.name, category.id);
        Ok(category)
    }

    pub async fn update_category(
        &self,
        actor: &Actor,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> AppResult<Category> {
        actor.require(Permission::UpdateCategories)?;
        input.validate()?;

        let existing = self.get_category(category_id).await?;

        let mut tx = self.db.begin().await?;

        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                color = COALESCE($3, color)
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.color)
        .bind(category_id)
        .fetch_one(&mut *tx)
        .await?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::UpdateCategory,
            category.id,
            Some(audit::snapshot(&existing)?),
            Some(audit::snapshot(&category)?),
        )
        .await?;

        tx.commit().await?;

        Ok(category)
    }

    /// Delete a category. Rejected while any supply references it.
    pub async fn delete_category(&self, actor: &Actor, category_id: Uuid) -> AppResult<()> {
        actor.require(Permission::DeleteCategories)?;

        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE id = $1 FOR UPDATE",
        )
        .bind(category_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;

        let dependents = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM supplies WHERE category_id = $1",
        )
        .bind(category_id)
        .fetch_one(&mut *tx)
        .await?;

        shared::ensure_no_dependents("category", dependents)?;

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&mut *tx)
            .await?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::DeleteCategory,
            category_id,
            Some(audit::snapshot(&existing)?),
            None,
        )
        .await?;

        tx.commit().await?;

        tracing::info!("Deleted category {} ({})", existing.name, category_id);
        Ok(())
    }
}
