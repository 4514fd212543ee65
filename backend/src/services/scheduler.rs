//! Background alert sweeps

use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::config::AlertsConfig;
use crate::services::alert::AlertService;

/// Spawn the sweep loop. Ticks run sequentially; a failed tick is logged and
/// the loop carries on.
pub fn spawn_alert_sweeps(db: PgPool, config: AlertsConfig) -> JoinHandle<()> {
    let service = AlertService::new(db);
    let period = Duration::from_secs(config.sweep_interval_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            "Alert sweeps scheduled every {}s (expiration window {} days)",
            period.as_secs(),
            config.expiration_window_days
        );

        loop {
            ticker.tick().await;
            match service.run_sweeps(config.expiration_window_days).await {
                Ok(result) => tracing::debug!(
                    "Alert sweep finished: {} low stock, {} expiration",
                    result.low_stock_created,
                    result.expiration_created
                ),
                Err(e) => tracing::error!("Alert sweep failed: {}", e),
            }
        }
    })
}
