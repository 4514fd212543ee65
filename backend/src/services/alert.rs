//! Alert service: sweeps and alert lifecycle

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use shared::{plan_expiration_sweep, plan_low_stock_sweep, OpenAlertIndex};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Alert, AlertDraft, AlertSeverity, AlertType, AlertWithSupply, AuditAction, InventoryBatch,
    Supply, ALERT_WITH_SUPPLY_COLUMNS,
};
use crate::services::audit;
use crate::services::identity::Actor;
use crate::services::supply::load_active_stock;

/// Advisory lock key serializing sweeps across processes
const SWEEP_LOCK_KEY: i64 = 0x4d53_4941_4c52_5400;

const ALERT_LIST_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct AlertService {
    db: PgPool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertFilter {
    #[serde(default)]
    pub unread_only: bool,
    pub severity: Option<AlertSeverity>,
}

/// Alerts created by one sweep run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepResult {
    pub low_stock_created: usize,
    pub expiration_created: usize,
}

impl AlertService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Open a low-stock alert for every active supply at or below its
    /// reorder point that has none open
    pub async fn check_low_stock(&self) -> AppResult<usize> {
        let stock = load_active_stock(&self.db).await?;
        let levels: Vec<(Supply, i64)> = stock
            .into_iter()
            .map(|s| {
                let level = s.current_stock();
                (s.supply, level)
            })
            .collect();

        let mut tx = self.db.begin().await?;
        lock_sweeps(&mut *tx).await?;
        let mut open = load_open_index(&mut *tx).await?;

        let drafts = plan_low_stock_sweep(&levels, &mut open);
        for draft in &drafts {
            insert_alert(&mut *tx, draft).await?;
        }

        tx.commit().await?;

        if !drafts.is_empty() {
            tracing::info!("Low stock sweep created {} alerts", drafts.len());
        }
        Ok(drafts.len())
    }

    /// Open an expiration alert per supply with a batch expiring within
    /// `window_days`. Deactivated supplies still hold stock and are included.
    pub async fn check_expiring(&self, window_days: i64) -> AppResult<usize> {
        let now = Utc::now();
        let cutoff = now + Duration::days(window_days);

        let batches = sqlx::query_as::<_, InventoryBatch>(
            r#"
            SELECT * FROM inventory_batches
            WHERE quantity > 0
              AND expiration_date IS NOT NULL
              AND expiration_date <= $1
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.db)
        .await?;

        let supply_ids: Vec<Uuid> = batches.iter().map(|b| b.supply_id).collect();
        let supplies = sqlx::query_as::<_, Supply>("SELECT * FROM supplies WHERE id = ANY($1)")
            .bind(&supply_ids)
            .fetch_all(&self.db)
            .await?;

        let mut tx = self.db.begin().await?;
        lock_sweeps(&mut *tx).await?;
        let mut open = load_open_index(&mut *tx).await?;

        let drafts = plan_expiration_sweep(&supplies, &batches, now, window_days, &mut open);
        for draft in &drafts {
            insert_alert(&mut *tx, draft).await?;
        }

        tx.commit().await?;

        if !drafts.is_empty() {
            tracing::info!("Expiration sweep created {} alerts", drafts.len());
        }
        Ok(drafts.len())
    }

    /// Run both sweeps
    pub async fn run_sweeps(&self, window_days: i64) -> AppResult<SweepResult> {
        Ok(SweepResult {
            low_stock_created: self.check_low_stock().await?,
            expiration_created: self.check_expiring(window_days).await?,
        })
    }

    /// Newest alerts first. `unread_only` keeps unread, unresolved alerts.
    pub async fn list_alerts(&self, filter: AlertFilter) -> AppResult<Vec<AlertWithSupply>> {
        let sql = format!(
            r#"
            SELECT {ALERT_WITH_SUPPLY_COLUMNS}
            FROM alerts a
            LEFT JOIN supplies s ON s.id = a.supply_id
            WHERE (NOT $1 OR (a.is_read = false AND a.is_resolved = false))
              AND ($2::alert_severity IS NULL OR a.severity = $2)
            ORDER BY a.created_at DESC
            LIMIT $3
            "#
        );
        let alerts = sqlx::query_as::<_, AlertWithSupply>(&sql)
        .bind(filter.unread_only)
        .bind(filter.severity)
        .bind(ALERT_LIST_LIMIT)
        .fetch_all(&self.db)
        .await?;

        Ok(alerts)
    }

    pub async fn mark_alert_read(&self, actor: &Actor, alert_id: Uuid) -> AppResult<Alert> {
        let mut tx = self.db.begin().await?;

        let alert = sqlx::query_as::<_, Alert>(
            "UPDATE alerts SET is_read = true WHERE id = $1 RETURNING *",
        )
        .bind(alert_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert".to_string()))?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::MarkAlertRead,
            alert.id,
            None,
            Some(serde_json::json!({ "is_read": true })),
        )
        .await?;

        tx.commit().await?;

        Ok(alert)
    }

    /// Resolve an alert, recording who resolved it and when
    pub async fn resolve_alert(&self, actor: &Actor, alert_id: Uuid) -> AppResult<Alert> {
        let mut tx = self.db.begin().await?;

        let alert = sqlx::query_as::<_, Alert>(
            r#"
            UPDATE alerts
            SET is_resolved = true, resolved_by = $1, resolved_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(actor.user_id())
        .bind(alert_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert".to_string()))?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::ResolveAlert,
            alert.id,
            None,
            Some(serde_json::json!({
                "is_resolved": true,
                "resolved_by": actor.user_id(),
            })),
        )
        .await?;

        tx.commit().await?;

        tracing::info!("Alert {} resolved by {}", alert.id, actor.user_id());
        Ok(alert)
    }
}

/// Insert a planned alert
pub async fn insert_alert<'e, E>(executor: E, draft: &AlertDraft) -> AppResult<Alert>
where
    E: PgExecutor<'e>,
{
    let alert = sqlx::query_as::<_, Alert>(
        r#"
        INSERT INTO alerts (alert_type, supply_id, batch_id, title, message, severity)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(draft.alert_type)
    .bind(draft.supply_id)
    .bind(draft.batch_id)
    .bind(&draft.title)
    .bind(&draft.message)
    .bind(draft.severity)
    .fetch_one(executor)
    .await?;

    Ok(alert)
}

async fn lock_sweeps<'e, E>(executor: E) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SWEEP_LOCK_KEY)
        .execute(executor)
        .await?;
    Ok(())
}

async fn load_open_index<'e, E>(executor: E) -> AppResult<OpenAlertIndex>
where
    E: PgExecutor<'e>,
{
    let open = sqlx::query_as::<_, (Uuid, AlertType)>(
        "SELECT supply_id, alert_type FROM alerts WHERE is_resolved = false",
    )
    .fetch_all(executor)
    .await?;

    Ok(open.into_iter().collect())
}
