//! Audit trail recording and listing

use serde::Serialize;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{AuditAction, AuditLog, Permission};
use crate::services::identity::Actor;

/// Append one audit entry. Runs on whatever executor the caller's mutation
/// uses, so the entry commits or rolls back with it.
pub async fn record<'e, E>(
    executor: E,
    user_id: Option<Uuid>,
    action: AuditAction,
    entity_id: Uuid,
    old_values: Option<serde_json::Value>,
    new_values: Option<serde_json::Value>,
) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO audit_logs (user_id, action, entity_type, entity_id, old_values, new_values)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(action.as_str())
    .bind(action.entity_type())
    .bind(entity_id)
    .bind(old_values)
    .bind(new_values)
    .execute(executor)
    .await?;

    Ok(())
}

/// JSON snapshot of a record for `old_values`/`new_values`
pub fn snapshot<T: Serialize>(value: &T) -> AppResult<serde_json::Value> {
    Ok(serde_json::to_value(value).map_err(anyhow::Error::from)?)
}

#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Most recent audit entries, newest first
    pub async fn list_audit_logs(&self, actor: &Actor, limit: i64) -> AppResult<Vec<AuditLog>> {
        actor.require(Permission::ViewAuditLogs)?;

        let logs = sqlx::query_as::<_, AuditLog>(
            "SELECT * FROM audit_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit.clamp(1, 500))
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }
}
